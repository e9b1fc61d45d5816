//! Genetic operators: mutation and recombination of schedules.
//!
//! Both operators leave their parents untouched and return brand-new
//! schedules whose occupancy index has already been rebuilt. Fitness is left
//! stale; the caller evaluates the results.

use crate::assignment::{Assignment, ConfirmedPlacement};
use crate::problem::Problem;
use itertools::Itertools;
use rand::{seq::index, seq::SliceRandom, Rng};
use std::iter;

/// Implements the genetic operators for schedules.
pub struct Genetic;

impl Genetic {
    /// Move `num_mutations` randomly chosen placements to random locations.
    ///
    /// Start weeks are kept and feasibility is not checked here; evaluation of
    /// the returned schedule surfaces any violation.
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        parent: &Assignment,
        problem: &Problem,
        num_mutations: usize,
        rng: &mut R,
    ) -> Assignment {
        let mut placements = parent.placements.clone();

        if !placements.is_empty() && problem.location_count() > 0 {
            for _ in 0..num_mutations {
                let i = rng.gen_range(0..placements.len());
                let location = rng.gen_range(0..problem.location_count());
                placements[i].slot_index = problem.slot_index(location, placements[i].start_week);
            }
        }

        let mut mutant = Assignment::from_valid_placements(problem, placements);
        mutant.generation = parent.generation + 1;
        mutant
    }

    /// Produce offspring by multi-point crossover of two parents.
    ///
    /// Each parent's placement list is shuffled independently before cutting,
    /// so genes carry no positional meaning. Offspring alternate segments
    /// between the cut points, and successive offspring alternate which parent
    /// supplies the first segment. An offspring may therefore hold some
    /// assignables twice and others not at all; evaluation reports that.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        parent1: &Assignment,
        parent2: &Assignment,
        problem: &Problem,
        num_points: usize,
        num_offspring: usize,
        rng: &mut R,
    ) -> Vec<Assignment> {
        let size = parent1.placements.len().min(parent2.placements.len());

        // Distinct cut points in ascending order
        let mut cuts = index::sample(rng, size, num_points.min(size)).into_vec();
        cuts.sort_unstable();

        let mut genes1 = parent1.placements.clone();
        let mut genes2 = parent2.placements.clone();
        genes1.shuffle(rng);
        genes2.shuffle(rng);
        let parents = [&genes1, &genes2];

        let boundaries: Vec<usize> = iter::once(0)
            .chain(cuts)
            .chain(iter::once(size))
            .collect();
        let generation = parent1.generation.max(parent2.generation) + 1;

        (0..num_offspring)
            .map(|k| {
                let placements: Vec<ConfirmedPlacement> = boundaries
                    .iter()
                    .tuple_windows()
                    .enumerate()
                    .flat_map(|(segment, (&lo, &hi))| {
                        parents[(k + segment) % 2][lo..hi].iter().copied()
                    })
                    .collect();

                let mut offspring = Assignment::from_valid_placements(problem, placements);
                offspring.generation = generation;
                offspring
            })
            .collect()
    }
}
