//! The generational search loop.
//!
//! The engine seeds a population, then alternates between evaluating the
//! current generation and evolving the next one until a viable schedule above
//! the fitness threshold appears, the best fitness stagnates, or the host asks
//! it to stop.

use crate::assignment::{Assignment, NonViableReason};
use crate::config::Config;
use crate::error::ConfigError;
use crate::fitness::{EvaluationScores, FitnessEvaluator};
use crate::genetic::Genetic;
use crate::population::Population;
use crate::problem::Problem;
use crate::quality::QualityReport;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// A viable schedule exceeded the fitness threshold
    ViableFound,
    /// The best fitness did not change for the configured number of generations
    Stagnated,
    /// Stopped through a [`StopHandle`]
    Cancelled,
    GenerationLimit,
    TimeLimit,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::ViableFound => "viable schedule found",
            Termination::Stagnated => "stagnated",
            Termination::Cancelled => "cancelled",
            Termination::GenerationLimit => "generation limit reached",
            Termination::TimeLimit => "time limit reached",
        };
        f.write_str(text)
    }
}

/// Result of evaluating one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Continue,
    /// Index of the fittest viable member above the threshold
    ViableFound(usize),
    Stagnated,
}

/// Progress of the search after a generation has been evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSnapshot {
    pub iteration: u32,
    pub best_fitness: f64,
    pub stagnation: u32,
    /// Fitness of every member, ascending
    pub fitnesses: Vec<f64>,
}

/// Final outcome of a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The winning schedule, or the fittest one found when none was viable
    pub assignment: Assignment,
    pub fitness: f64,
    pub viable: bool,
    pub non_viable_reason: Option<NonViableReason>,
    pub scores: EvaluationScores,
    pub quality: QualityReport,
    /// Number of generations evaluated
    pub generations: u32,
    pub termination: Termination,
    pub run_time: Duration,
}

/// Receives progress from a running search.
pub trait SearchObserver {
    /// Called after every evaluated generation.
    fn on_generation(&mut self, _snapshot: &GenerationSnapshot) {}

    /// Called once with the final result.
    fn on_finish(&mut self, _result: &SearchResult) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Cloneable flag used to cancel a search from another thread.
///
/// Cancellation takes effect at the next generation boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        StopHandle::default()
    }

    /// Request the search to stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives the genetic search over one problem.
pub struct SearchEngine {
    problem: Problem,
    config: Config,
    evaluator: FitnessEvaluator,
    genetic: Genetic,
    population: Population,
    rng: ChaCha8Rng,
    iterations: u32,
    best_fitness: Option<f64>,
    stagnation: u32,
    stop: StopHandle,
    start_time: Instant,
}

impl SearchEngine {
    /// Create a new engine, rejecting an invalid configuration.
    pub fn new(problem: Problem, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(SearchEngine {
            evaluator: FitnessEvaluator::from_config(&config),
            population: Population::new(config.population_size),
            genetic: Genetic,
            problem,
            config,
            rng,
            iterations: 0,
            best_fitness: None,
            stagnation: 0,
            stop: StopHandle::new(),
            start_time: Instant::now(),
        })
    }

    /// Handle that cancels this engine's search when stopped.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Generations evaluated so far.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Consecutive generations without a change in best fitness.
    pub fn stagnation(&self) -> u32 {
        self.stagnation
    }

    /// Replace the population with freshly generated, evaluated schedules.
    pub fn seed_population(&mut self) {
        self.population = Population::new(self.config.population_size);
        self.population.initialize(
            &self.problem,
            &self.evaluator,
            self.config.population_size,
            &mut self.rng,
        );
        self.iterations = 0;
        self.best_fitness = None;
        self.stagnation = 0;
        info!(
            "Seeded population of {} schedules for {} assignables over {} locations",
            self.population.len(),
            self.problem.assignable_count(),
            self.problem.location_count()
        );
    }

    /// Re-score the population and decide whether the search is over.
    pub fn evaluate_generation(&mut self) -> GenerationOutcome {
        self.population.reevaluate(&self.problem, &self.evaluator);
        self.iterations += 1;

        if let Some(index) = self
            .population
            .best_viable_above(self.config.fitness_threshold)
        {
            let winner = &self.population.individuals[index];
            info!(
                "Viable schedule {} found in generation {} with fitness {:.4}",
                winner.id, self.iterations, winner.fitness
            );
            return GenerationOutcome::ViableFound(index);
        }

        let best = match self.population.best() {
            Some(best) => best,
            None => return GenerationOutcome::Continue,
        };

        if self.best_fitness == Some(best.fitness) {
            self.stagnation += 1;
        } else {
            if self.best_fitness.map_or(true, |previous| best.fitness > previous) {
                info!(
                    "Generation {}: best fitness {:.4} (schedule {})",
                    self.iterations, best.fitness, best.id
                );
            }
            self.best_fitness = Some(best.fitness);
            self.stagnation = 0;
        }

        if self.stagnation >= self.config.max_stagnant_generations {
            info!(
                "No change in best fitness for {} generations, stopping at {:.4}",
                self.stagnation, best.fitness
            );
            return GenerationOutcome::Stagnated;
        }

        GenerationOutcome::Continue
    }

    /// Produce the next generation: refresh, mutate, recombine, then replace
    /// the weakest unprotected members with the new candidates.
    pub fn evolve(&mut self) {
        let mut candidates = Vec::new();

        for _ in 0..self.config.refresh_count() {
            candidates.push(Population::random_individual(
                &self.problem,
                &self.evaluator,
                &mut self.rng,
            ));
        }
        let refreshed = candidates.len();

        for i in 0..self.population.len() {
            if self.rng.gen::<f64>() < self.config.mutation_probability {
                let mut mutant = self.genetic.mutate(
                    &self.population.individuals[i].assignment,
                    &self.problem,
                    self.config.mutations_per_member,
                    &mut self.rng,
                );
                self.evaluator.evaluate(&mut mutant, &self.problem);
                candidates.push(Population::individual_from(mutant, &mut self.rng));
            }
        }
        let mutated = candidates.len() - refreshed;

        let pairs = self.population.select_parents(&mut self.rng);
        for (first, second) in pairs {
            if self.rng.gen::<f64>() >= self.config.recombination_probability {
                continue;
            }
            let offspring = self.genetic.crossover(
                &self.population.individuals[first].assignment,
                &self.population.individuals[second].assignment,
                &self.problem,
                self.config.crossover_points,
                1,
                &mut self.rng,
            );
            for mut child in offspring {
                self.evaluator.evaluate(&mut child, &self.problem);
                candidates.push(Population::individual_from(child, &mut self.rng));
            }
        }
        let recombined = candidates.len() - refreshed - mutated;

        let replaced = self
            .population
            .replace_weakest(candidates, self.config.replaceable_count());
        debug!(
            "Generation {}: {} refreshed, {} mutated, {} recombined, {} replaced",
            self.iterations, refreshed, mutated, recombined, replaced
        );
    }

    /// Progress after the most recent evaluation.
    pub fn snapshot(&self) -> GenerationSnapshot {
        GenerationSnapshot {
            iteration: self.iterations,
            best_fitness: self.population.best().map_or(0.0, |best| best.fitness),
            stagnation: self.stagnation,
            fitnesses: self.population.fitnesses(),
        }
    }

    /// Evaluate the current generation and, unless the search is over, evolve
    /// the next one. Seeds the population on first use.
    pub fn step(&mut self) -> Option<SearchResult> {
        self.step_with_observer(&mut NoopObserver)
    }

    /// Run the search to completion.
    pub fn run(&mut self) -> SearchResult {
        self.run_with_observer(&mut NoopObserver)
    }

    /// Run the search to completion, reporting progress to an observer.
    pub fn run_with_observer(&mut self, observer: &mut dyn SearchObserver) -> SearchResult {
        self.start_time = Instant::now();
        self.seed_population();

        loop {
            if let Some(result) = self.step_with_observer(observer) {
                info!(
                    "Search finished after {} generations: {}",
                    result.generations, result.termination
                );
                observer.on_finish(&result);
                return result;
            }
        }
    }

    fn step_with_observer(&mut self, observer: &mut dyn SearchObserver) -> Option<SearchResult> {
        if self.population.is_empty() {
            self.start_time = Instant::now();
            self.seed_population();
        }

        let outcome = self.evaluate_generation();
        let snapshot = self.snapshot();
        debug!(
            "Generation {}: best {:.4}, stagnation {}",
            snapshot.iteration, snapshot.best_fitness, snapshot.stagnation
        );
        observer.on_generation(&snapshot);

        let finished = match outcome {
            GenerationOutcome::ViableFound(index) => Some((Termination::ViableFound, index)),
            GenerationOutcome::Stagnated => Some((Termination::Stagnated, self.best_index())),
            GenerationOutcome::Continue => self
                .external_termination()
                .map(|termination| (termination, self.best_index())),
        };

        match finished {
            Some((termination, index)) => Some(self.result(index, termination)),
            None => {
                self.evolve();
                None
            }
        }
    }

    fn best_index(&self) -> usize {
        self.population.len().saturating_sub(1)
    }

    fn external_termination(&self) -> Option<Termination> {
        if self.stop.is_stopped() {
            info!("Search cancelled in generation {}", self.iterations);
            return Some(Termination::Cancelled);
        }
        if let Some(limit) = self.config.max_generations {
            if self.iterations >= limit {
                return Some(Termination::GenerationLimit);
            }
        }
        if let Some(limit) = self.config.time_limit {
            if self.start_time.elapsed() >= limit {
                return Some(Termination::TimeLimit);
            }
        }
        None
    }

    fn result(&self, index: usize, termination: Termination) -> SearchResult {
        let individual = &self.population.individuals[index];
        let assignment = individual.assignment.clone();
        let quality = QualityReport::check(&assignment, &self.problem);

        SearchResult {
            fitness: assignment.fitness,
            viable: assignment.is_viable(),
            non_viable_reason: assignment.non_viable_reason,
            scores: assignment.scores.clone(),
            quality,
            generations: self.iterations,
            termination,
            run_time: self.start_time.elapsed(),
            assignment,
        }
    }
}
