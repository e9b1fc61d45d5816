//! Integration tests for the search loop.

use placement_ga::engine::{
    GenerationOutcome, GenerationSnapshot, SearchEngine, SearchObserver, SearchResult, Termination,
};
use placement_ga::error::ConfigError;
use placement_ga::problem::{Assignable, Location, Partition, Problem, RiskLevel};
use placement_ga::Config;
use std::time::Duration;

/// Creates a roomy problem: four wards, three holders with two blocks each.
fn create_test_problem() -> Problem {
    let departments = ["Cardiology", "Neurology", "Oncology", "Renal"];
    let locations = departments
        .iter()
        .enumerate()
        .map(|(i, department)| {
            Location::new(
                i,
                &format!("Ward{}", i),
                department,
                52,
                RiskLevel::LowMedium,
                3,
                3,
                3,
                3,
            )
        })
        .collect();

    let mut assignables = Vec::new();
    for (h, holder) in ["A", "B", "C"].iter().enumerate() {
        for block in 0..2 {
            assignables.push(Assignable::new(
                h * 2 + block,
                &format!("{}_{}", holder, block + 1),
                "CohortA",
                2,
                block * 3,
                "2020-01-06",
                Partition::P1,
                RiskLevel::LowMedium,
            ));
        }
    }

    Problem::new(locations, assignables, 6).unwrap()
}

/// One assignable, two wards: fitness values settle immediately.
fn create_tiny_problem() -> Problem {
    Problem::new(
        vec![
            Location::new(0, "WardA", "Cardiology", 52, RiskLevel::LowMedium, 3, 3, 3, 3),
            Location::new(1, "WardB", "Neurology", 52, RiskLevel::LowMedium, 2, 2, 2, 2),
        ],
        vec![Assignable::new(
            0,
            "A_1",
            "CohortA",
            2,
            1,
            "2020-01-13",
            Partition::P1,
            RiskLevel::LowMedium,
        )],
        4,
    )
    .unwrap()
}

fn create_test_config() -> Config {
    Config::new()
        .with_seed(42)
        .with_population_size(10)
        .with_max_generations(200)
}

#[derive(Default)]
struct RecordingObserver {
    snapshots: Vec<GenerationSnapshot>,
    finished: usize,
}

impl SearchObserver for RecordingObserver {
    fn on_generation(&mut self, snapshot: &GenerationSnapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn on_finish(&mut self, _result: &SearchResult) {
        self.finished += 1;
    }
}

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let config = Config::new().with_fitness_threshold(1.5);
    let err = SearchEngine::new(create_test_problem(), config).err();
    assert_eq!(
        err,
        Some(ConfigError::OutOfUnitRange {
            name: "fitness_threshold",
            value: 1.5
        })
    );

    let config = Config::new().with_population_size(0);
    assert_eq!(
        SearchEngine::new(create_test_problem(), config).err(),
        Some(ConfigError::EmptyPopulation)
    );
}

#[test]
fn test_viable_schedule_ends_search_early() {
    // Every generated schedule is viable and scores well above one half
    let config = create_test_config().with_fitness_threshold(0.5);
    let mut engine = SearchEngine::new(create_test_problem(), config).unwrap();

    let result = engine.run();

    assert_eq!(result.termination, Termination::ViableFound);
    assert_eq!(result.generations, 1);
    assert!(result.viable);
    assert!(result.fitness > 0.5);
    assert_eq!(result.non_viable_reason, None);
    assert_eq!(result.assignment.placement_count(), 6);
    assert!(result.quality.is_clean(), "{:?}", result.quality);
}

#[test]
fn test_search_stagnates_when_threshold_unreachable() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_stagnant_generations(3);
    let mut engine = SearchEngine::new(create_tiny_problem(), config).unwrap();

    let result = engine.run();

    assert_eq!(result.termination, Termination::Stagnated);
    assert!(result.generations >= 4);
    assert!(result.fitness > 0.0 && result.fitness <= 1.0);
    assert!(result.viable);
}

#[test]
fn test_generation_limit_stops_search() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_stagnant_generations(1000)
        .with_max_generations(3);
    let mut engine = SearchEngine::new(create_test_problem(), config).unwrap();

    let result = engine.run();

    assert_eq!(result.termination, Termination::GenerationLimit);
    assert_eq!(result.generations, 3);
}

#[test]
fn test_time_limit_stops_search() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_stagnant_generations(u32::MAX)
        .with_time_limit(Duration::from_millis(0));
    let mut engine = SearchEngine::new(create_test_problem(), config).unwrap();

    let result = engine.run();

    assert_eq!(result.termination, Termination::TimeLimit);
    assert_eq!(result.generations, 1);
}

#[test]
fn test_stop_handle_cancels_at_generation_boundary() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_stagnant_generations(1000);
    let mut engine = SearchEngine::new(create_test_problem(), config).unwrap();

    let handle = engine.stop_handle();
    handle.stop();
    let result = engine.run();

    // The first generation is still evaluated and its best returned
    assert_eq!(result.termination, Termination::Cancelled);
    assert_eq!(result.generations, 1);
    assert_eq!(result.assignment.placement_count(), 6);
}

#[test]
fn test_population_size_is_constant() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_stagnant_generations(1000)
        .with_refresh_proportion(0.5)
        .with_mutation_probability(1.0)
        .with_recombination_probability(1.0);
    let mut engine = SearchEngine::new(create_test_problem(), config).unwrap();
    engine.seed_population();

    for _ in 0..5 {
        assert_eq!(engine.evaluate_generation(), GenerationOutcome::Continue);
        engine.evolve();
        assert_eq!(engine.population().len(), 10);
    }
}

#[test]
fn test_best_fitness_never_drops_with_protection() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_stagnant_generations(1000)
        .with_protected_proportion(0.2);
    let mut engine = SearchEngine::new(create_test_problem(), config).unwrap();
    engine.seed_population();

    let mut previous = 0.0;
    for _ in 0..10 {
        engine.evaluate_generation();
        let best = engine.snapshot().best_fitness;
        assert!(best >= previous);
        previous = best;
        engine.evolve();
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_generations(8);

    let mut first = SearchEngine::new(create_test_problem(), config.clone()).unwrap();
    let mut second = SearchEngine::new(create_test_problem(), config).unwrap();
    let a = first.run();
    let b = second.run();

    assert_eq!(a.fitness, b.fitness);
    assert_eq!(a.generations, b.generations);
    assert_eq!(a.assignment.placements, b.assignment.placements);
}

#[test]
fn test_observer_sees_every_generation() {
    let config = create_test_config()
        .with_fitness_threshold(1.0)
        .with_max_stagnant_generations(1000)
        .with_max_generations(4);
    let mut engine = SearchEngine::new(create_test_problem(), config).unwrap();
    let mut observer = RecordingObserver::default();

    let result = engine.run_with_observer(&mut observer);

    assert_eq!(observer.finished, 1);
    assert_eq!(observer.snapshots.len(), result.generations as usize);
    let iterations: Vec<u32> = observer.snapshots.iter().map(|s| s.iteration).collect();
    assert_eq!(iterations, vec![1, 2, 3, 4]);
    for snapshot in &observer.snapshots {
        assert_eq!(snapshot.fitnesses.len(), 10);
        assert!(snapshot.fitnesses.windows(2).all(|w| w[0] <= w[1]));
    }
}
