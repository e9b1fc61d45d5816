//! Unit tests for the genetic operators.

use placement_ga::assignment::Assignment;
use placement_ga::genetic::Genetic;
use placement_ga::problem::{Assignable, Location, Partition, Problem, RiskLevel};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Creates a problem with four wards and eight single-block holders.
fn create_test_problem() -> Problem {
    let locations = (0..4)
        .map(|i| {
            Location::new(
                i,
                &format!("Ward{}", i),
                &format!("Department{}", i),
                52,
                RiskLevel::LowMedium,
                4,
                4,
                4,
                4,
            )
        })
        .collect();
    let assignables = (0..8)
        .map(|i| {
            Assignable::new(
                i,
                &format!("H{}_1", i),
                "CohortA",
                1 + i % 3,
                i % 4,
                "2020-01-06",
                Partition::P2,
                RiskLevel::LowMedium,
            )
        })
        .collect();
    Problem::new(locations, assignables, 8).unwrap()
}

#[test]
fn test_mutation_preserves_placement_count() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let parent = Assignment::random(&problem, &mut rng);

    for num_mutations in [0, 1, 3, 20] {
        let mutant = genetic.mutate(&parent, &problem, num_mutations, &mut rng);
        assert_eq!(mutant.placement_count(), parent.placement_count());
    }
}

#[test]
fn test_mutation_only_moves_locations() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let parent = Assignment::random(&problem, &mut rng);
    let mutant = genetic.mutate(&parent, &problem, 5, &mut rng);

    for (before, after) in parent.placements.iter().zip(&mutant.placements) {
        assert_eq!(before.assignable, after.assignable);
        assert_eq!(before.start_week, after.start_week);
        assert_eq!(before.duration, after.duration);
        assert_eq!(problem.week_of(after.slot_index), after.start_week);
    }
}

#[test]
fn test_mutation_leaves_parent_untouched() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let parent = Assignment::random(&problem, &mut rng);
    let snapshot = parent.placements.clone();

    let _ = genetic.mutate(&parent, &problem, 8, &mut rng);

    assert_eq!(parent.placements, snapshot);
}

#[test]
fn test_mutation_advances_generation_and_rebuilds_index() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let parent = Assignment::random(&problem, &mut rng);
    let mut mutant = genetic.mutate(&parent, &problem, 3, &mut rng);

    assert_eq!(mutant.generation, parent.generation + 1);

    // The returned index already reflects the moved placements
    let index = mutant.occupancy.clone();
    mutant.repopulate();
    assert_eq!(mutant.occupancy, index);
}

#[test]
fn test_crossover_preserves_placement_count() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let parent1 = Assignment::random(&problem, &mut rng);
    let parent2 = Assignment::random(&problem, &mut rng);

    for num_points in 1..=4 {
        let offspring = genetic.crossover(&parent1, &parent2, &problem, num_points, 1, &mut rng);
        assert_eq!(offspring.len(), 1);
        assert_eq!(offspring[0].placement_count(), problem.assignable_count());
    }
}

#[test]
fn test_crossover_handles_more_points_than_genes() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(22);
    let parent1 = Assignment::random(&problem, &mut rng);
    let parent2 = Assignment::random(&problem, &mut rng);

    let offspring = genetic.crossover(&parent1, &parent2, &problem, 50, 2, &mut rng);

    assert_eq!(offspring.len(), 2);
    for child in &offspring {
        assert_eq!(child.placement_count(), problem.assignable_count());
    }
}

#[test]
fn test_crossover_genes_come_from_parents() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let parent1 = Assignment::random(&problem, &mut rng);
    let parent2 = Assignment::random(&problem, &mut rng);

    let pool: HashSet<_> = parent1
        .placements
        .iter()
        .chain(&parent2.placements)
        .map(|p| (p.assignable, p.slot_index))
        .collect();

    let offspring = genetic.crossover(&parent1, &parent2, &problem, 2, 3, &mut rng);
    for child in &offspring {
        for p in &child.placements {
            assert!(pool.contains(&(p.assignable, p.slot_index)));
        }
    }
}

#[test]
fn test_crossover_generation_follows_older_parent() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut rng = ChaCha8Rng::seed_from_u64(31);
    let mut parent1 = Assignment::random(&problem, &mut rng);
    let parent2 = Assignment::random(&problem, &mut rng);
    parent1.generation = 6;

    let offspring = genetic.crossover(&parent1, &parent2, &problem, 2, 1, &mut rng);

    assert_eq!(offspring[0].generation, 7);
    assert_eq!(offspring[0].viable, None);
}

#[test]
fn test_crossover_is_reproducible_with_seeded_stream() {
    let problem = create_test_problem();
    let genetic = Genetic;
    let mut setup = ChaCha8Rng::seed_from_u64(1);
    let parent1 = Assignment::random(&problem, &mut setup);
    let parent2 = Assignment::random(&problem, &mut setup);

    let mut rng_a = ChaCha8Rng::seed_from_u64(99);
    let mut rng_b = ChaCha8Rng::seed_from_u64(99);
    let a = genetic.crossover(&parent1, &parent2, &problem, 3, 2, &mut rng_a);
    let b = genetic.crossover(&parent1, &parent2, &problem, 3, 2, &mut rng_b);

    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.placements, y.placements);
    }
}
