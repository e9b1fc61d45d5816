//! Individual representation for the genetic algorithm population.

use crate::assignment::Assignment;
use std::cmp::Ordering;

/// A member of the population: a schedule, its cached fitness and a tag for logs.
#[derive(Clone)]
pub struct Individual {
    /// The schedule represented by this individual
    pub assignment: Assignment,
    /// Fitness recorded at the last evaluation
    pub fitness: f64,
    /// Random tag used in progress messages
    pub id: u32,
}

impl Individual {
    /// Create a new individual, caching the schedule's current fitness.
    pub fn new(assignment: Assignment, id: u32) -> Self {
        Individual {
            fitness: assignment.fitness,
            assignment,
            id,
        }
    }

    /// Refresh the cached fitness from the schedule.
    pub fn sync_fitness(&mut self) {
        self.fitness = self.assignment.fitness;
    }

    /// Check if the schedule satisfies every hard constraint.
    pub fn is_viable(&self) -> bool {
        self.assignment.is_viable()
    }
}

impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        self.fitness == other.fitness
    }
}

impl Eq for Individual {}

impl PartialOrd for Individual {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Individual {
    fn cmp(&self, other: &Self) -> Ordering {
        // Ascending fitness, so the fittest individual sorts last
        self.fitness
            .partial_cmp(&other.fitness)
            .unwrap_or(Ordering::Equal)
    }
}
