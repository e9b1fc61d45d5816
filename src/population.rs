//! Population management for the genetic algorithm.
//!
//! The population is kept sorted by ascending fitness, so the fittest member
//! is always the last one.

use crate::assignment::Assignment;
use crate::fitness::FitnessEvaluator;
use crate::individual::Individual;
use crate::problem::Problem;
use rand::Rng;

/// Upper bound (exclusive) of the random tags given to individuals.
const MAX_INDIVIDUAL_ID: u32 = 10_000;

/// Normalised cumulative fitness distribution.
///
/// Entry `i` is the share of total fitness held by members `0..=i`. When the
/// total is zero every member gets an equal share.
pub fn cumulative_distribution(fitnesses: &[f64]) -> Vec<f64> {
    let n = fitnesses.len();
    let total: f64 = fitnesses.iter().sum();

    let mut cumulative: Vec<f64> = if total > 0.0 {
        fitnesses
            .iter()
            .scan(0.0, |acc, &f| {
                *acc += f;
                Some(*acc / total)
            })
            .collect()
    } else {
        (1..=n).map(|i| i as f64 / n as f64).collect()
    };

    if let Some(last) = cumulative.last_mut() {
        *last = 1.0;
    }
    cumulative
}

/// Index of the bracket of a cumulative distribution containing `draw` in [0, 1).
///
/// Members with zero share own an empty bracket and are never returned.
pub fn roulette_index(cumulative: &[f64], draw: f64) -> usize {
    cumulative
        .partition_point(|&c| c <= draw)
        .min(cumulative.len().saturating_sub(1))
}

/// Manages the population of schedules.
pub struct Population {
    pub individuals: Vec<Individual>,
}

impl Population {
    /// Create an empty population.
    pub fn new(size: usize) -> Self {
        Population {
            individuals: Vec::with_capacity(size),
        }
    }

    /// Fill the population with `size` randomly generated, evaluated schedules.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        problem: &Problem,
        evaluator: &FitnessEvaluator,
        size: usize,
        rng: &mut R,
    ) {
        for _ in 0..size {
            let individual = Self::random_individual(problem, evaluator, rng);
            self.individuals.push(individual);
        }
        self.sort();
    }

    /// Generate and evaluate one fresh schedule.
    pub fn random_individual<R: Rng + ?Sized>(
        problem: &Problem,
        evaluator: &FitnessEvaluator,
        rng: &mut R,
    ) -> Individual {
        let mut assignment = Assignment::random(problem, rng);
        evaluator.evaluate(&mut assignment, problem);
        Individual::new(assignment, rng.gen_range(0..MAX_INDIVIDUAL_ID))
    }

    /// Wrap an already evaluated schedule as an individual.
    pub fn individual_from<R: Rng + ?Sized>(assignment: Assignment, rng: &mut R) -> Individual {
        Individual::new(assignment, rng.gen_range(0..MAX_INDIVIDUAL_ID))
    }

    /// Rebuild and re-score every member, then restore the ordering.
    pub fn reevaluate(&mut self, problem: &Problem, evaluator: &FitnessEvaluator) {
        for individual in self.individuals.iter_mut() {
            individual.assignment.repopulate();
            evaluator.evaluate(&mut individual.assignment, problem);
            individual.sync_fitness();
        }
        self.sort();
    }

    /// Sort by ascending fitness.
    pub fn sort(&mut self) {
        self.individuals.sort();
    }

    /// The fittest member.
    pub fn best(&self) -> Option<&Individual> {
        self.individuals.last()
    }

    /// Fittest viable member whose fitness exceeds `threshold`.
    pub fn best_viable_above(&self, threshold: f64) -> Option<usize> {
        self.individuals
            .iter()
            .rposition(|ind| ind.is_viable() && ind.fitness > threshold)
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Fitness of every member in population order.
    pub fn fitnesses(&self) -> Vec<f64> {
        self.individuals.iter().map(|ind| ind.fitness).collect()
    }

    /// Select breeding pairs by roulette wheel.
    ///
    /// One uniform draw is made per member and mapped to the bracket of the
    /// cumulative fitness distribution containing it. Each draw's selection is
    /// paired with the next draw's (wrapping around), and pairs of a member
    /// with itself are dropped.
    pub fn select_parents<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(usize, usize)> {
        let n = self.individuals.len();
        if n < 2 {
            return Vec::new();
        }

        let cumulative = cumulative_distribution(&self.fitnesses());
        let selected: Vec<usize> = (0..n)
            .map(|_| roulette_index(&cumulative, rng.gen::<f64>()))
            .collect();

        (0..n)
            .map(|i| (selected[i], selected[(i + 1) % n]))
            .filter(|(first, second)| first != second)
            .collect()
    }

    /// Replace up to `replaceable` of the weakest members with the fittest candidates.
    ///
    /// The population size never changes: surplus candidates are dropped and,
    /// when there are too few, the remaining weak members stay.
    pub fn replace_weakest(&mut self, mut candidates: Vec<Individual>, replaceable: usize) -> usize {
        self.sort();
        candidates.sort_by(|a, b| b.cmp(a));

        let count = replaceable.min(candidates.len()).min(self.individuals.len());
        for (slot, candidate) in self.individuals[..count].iter_mut().zip(candidates) {
            *slot = candidate;
        }

        self.sort();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_distribution_is_normalised() {
        let cumulative = cumulative_distribution(&[0.1, 0.3, 0.6]);
        assert!((cumulative[0] - 0.1).abs() < 1e-12);
        assert!((cumulative[1] - 0.4).abs() < 1e-12);
        assert_eq!(cumulative[2], 1.0);
    }

    #[test]
    fn zero_total_fitness_is_uniform() {
        assert_eq!(cumulative_distribution(&[0.0, 0.0]), vec![0.5, 1.0]);
    }

    #[test]
    fn roulette_skips_zero_share_members() {
        let cumulative = cumulative_distribution(&[0.0, 1.0, 0.0]);
        for draw in [0.0, 0.25, 0.5, 0.999] {
            assert_eq!(roulette_index(&cumulative, draw), 1);
        }
    }

    #[test]
    fn roulette_brackets_are_half_open() {
        let cumulative = cumulative_distribution(&[0.5, 0.5]);
        assert_eq!(roulette_index(&cumulative, 0.49), 0);
        assert_eq!(roulette_index(&cumulative, 0.5), 1);
    }
}
