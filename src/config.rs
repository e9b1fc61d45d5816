//! Configuration parameters for the placement genetic algorithm.

use crate::error::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Weights of the fitness components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Per placement that stays within overall and partition capacity
    pub within_capacity: f64,
    /// Per placement whose holder is not booked elsewhere in the same week
    pub double_booked: f64,
    /// Awarded once when every assignable has a confirmed placement
    pub all_assigned: f64,
    /// Scales the mean ratio of distinct to visited locations per holder
    pub unique_locations: f64,
    /// Scales the mean ratio of distinct to visited department words per holder
    pub unique_departments: f64,
    /// Scales the mean location utilisation
    pub capacity_utilisation: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            within_capacity: 1.0,
            double_booked: 1.0,
            all_assigned: 1.0,
            unique_locations: 5.0,
            unique_departments: 5.0,
            capacity_utilisation: 2.0,
        }
    }
}

/// Bonus for holders whose visited departments include a given speciality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialityCheck {
    pub name: String,
    pub enabled: bool,
    pub weight: f64,
    /// Lower-case stems matched against cleaned department words
    pub stems: Vec<String>,
}

impl SpecialityCheck {
    /// Create a disabled check with unit weight.
    pub fn new(name: &str, stems: &[&str]) -> Self {
        SpecialityCheck {
            name: name.to_string(),
            enabled: false,
            weight: 1.0,
            stems: stems.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Check whether a cleaned department word contains one of the stems.
    pub fn matches(&self, word: &str) -> bool {
        self.stems.iter().any(|stem| word.contains(stem.as_str()))
    }
}

/// The four speciality checks known to the scheduler, all switched off.
pub fn default_speciality_checks() -> Vec<SpecialityCheck> {
    vec![
        SpecialityCheck::new("medical", &["medical", "medicine"]),
        SpecialityCheck::new("surgical", &["surgical", "surgery"]),
        SpecialityCheck::new("community", &["community"]),
        SpecialityCheck::new("critical_care", &["critical", "emergency"]),
    ]
}

/// Configuration settings for the search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fitness component weights
    pub weights: ScoringWeights,
    /// Optional speciality bonuses
    pub specialities: Vec<SpecialityCheck>,
    /// Number of schedules kept in the population
    pub population_size: usize,
    /// Fraction of the population generated afresh every generation
    pub refresh_proportion: f64,
    /// Probability that a member is mutated in a generation
    pub mutation_probability: f64,
    /// Number of placements moved per mutation
    pub mutations_per_member: usize,
    /// Probability that a selected pair produces offspring
    pub recombination_probability: f64,
    /// Number of cut points used by recombination
    pub crossover_points: usize,
    /// Fraction of the fittest members never replaced
    pub protected_proportion: f64,
    /// Generations without a change of best fitness before the search stops
    pub max_stagnant_generations: u32,
    /// A viable schedule must score strictly above this to end the search early
    pub fitness_threshold: f64,
    /// Seed for the random stream; entropy when absent
    pub seed: Option<u64>,
    /// Optional hard cap on generations
    pub max_generations: Option<u32>,
    /// Optional time limit for the search
    pub time_limit: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            weights: ScoringWeights::default(),
            specialities: default_speciality_checks(),
            population_size: 50,
            refresh_proportion: 0.1,
            mutation_probability: 0.3,
            mutations_per_member: 2,
            recombination_probability: 0.6,
            crossover_points: 2,
            protected_proportion: 0.2,
            max_stagnant_generations: 50,
            fitness_threshold: 0.9,
            seed: None,
            max_generations: None,
            time_limit: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("refresh_proportion", self.refresh_proportion),
            ("mutation_probability", self.mutation_probability),
            ("recombination_probability", self.recombination_probability),
            ("protected_proportion", self.protected_proportion),
            ("fitness_threshold", self.fitness_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }

        let w = &self.weights;
        let weights = [
            ("within_capacity", w.within_capacity),
            ("double_booked", w.double_booked),
            ("all_assigned", w.all_assigned),
            ("unique_locations", w.unique_locations),
            ("unique_departments", w.unique_departments),
            ("capacity_utilisation", w.capacity_utilisation),
        ];
        let speciality_weights = self
            .specialities
            .iter()
            .map(|check| (check.name.as_str(), check.weight));
        for (name, value) in weights.into_iter().chain(speciality_weights) {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: name.to_string(),
                    value,
                });
            }
        }

        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.crossover_points == 0 {
            return Err(ConfigError::NoCrossoverPoints);
        }
        if self.crossover_points >= self.population_size {
            return Err(ConfigError::TooManyCrossoverPoints {
                points: self.crossover_points,
                population: self.population_size,
            });
        }
        if self.max_stagnant_generations == 0 {
            return Err(ConfigError::ZeroStagnationLimit);
        }

        Ok(())
    }

    /// Number of fresh random schedules introduced each generation.
    pub fn refresh_count(&self) -> usize {
        (self.population_size as f64 * self.refresh_proportion) as usize
    }

    /// Number of population slots open to replacement each generation.
    pub fn replaceable_count(&self) -> usize {
        (self.population_size as f64 * (1.0 - self.protected_proportion)) as usize
    }

    /// Set the scoring weights.
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Enable a speciality bonus by name with the given weight.
    pub fn with_speciality(mut self, name: &str, weight: f64) -> Self {
        if let Some(check) = self.specialities.iter_mut().find(|c| c.name == name) {
            check.enabled = true;
            check.weight = weight;
        }
        self
    }

    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the refresh proportion.
    pub fn with_refresh_proportion(mut self, proportion: f64) -> Self {
        self.refresh_proportion = proportion;
        self
    }

    /// Set the per-member mutation probability.
    pub fn with_mutation_probability(mut self, probability: f64) -> Self {
        self.mutation_probability = probability;
        self
    }

    /// Set the number of moves per mutation.
    pub fn with_mutations_per_member(mut self, n: usize) -> Self {
        self.mutations_per_member = n;
        self
    }

    /// Set the per-pair recombination probability.
    pub fn with_recombination_probability(mut self, probability: f64) -> Self {
        self.recombination_probability = probability;
        self
    }

    /// Set the number of crossover cut points.
    pub fn with_crossover_points(mut self, points: usize) -> Self {
        self.crossover_points = points;
        self
    }

    /// Set the protected top proportion.
    pub fn with_protected_proportion(mut self, proportion: f64) -> Self {
        self.protected_proportion = proportion;
        self
    }

    /// Set the stagnation limit.
    pub fn with_max_stagnant_generations(mut self, generations: u32) -> Self {
        self.max_stagnant_generations = generations;
        self
    }

    /// Set the fitness threshold for accepting a viable schedule.
    pub fn with_fitness_threshold(mut self, threshold: f64) -> Self {
        self.fitness_threshold = threshold;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the generation cap.
    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = Some(generations);
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }
}
