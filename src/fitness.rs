//! Fitness and viability evaluation of schedules.
//!
//! Every confirmed placement contributes a capacity component and a
//! double-booking component; schedule-wide bonuses reward variety of locations
//! and departments per holder, complete assignment, utilisation and, when
//! enabled, speciality coverage. The raw total is divided by the maximum score
//! derived analytically from the same weights, so fitness lies in [0, 1].

use crate::assignment::{Assignment, NonViableReason};
use crate::config::{Config, ScoringWeights, SpecialityCheck};
use crate::problem::Problem;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Words removed from department labels before comparing them.
const DEPARTMENT_STOPWORDS: [&str; 4] = ["and", "the", "of", "none"];

/// Sub-scores recorded by the last evaluation of a schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScores {
    /// Weighted within-capacity total; zero once any placement exceeds capacity
    pub capacity_score: f64,
    /// Weighted not-double-booked total; zero once any holder is double booked
    pub double_booked_score: f64,
    /// Mean occupants-to-capacity ratio over placements; above 1 when locations are overfilled
    pub mean_utilisation: f64,
    pub mean_unique_locations: f64,
    pub mean_unique_departments: f64,
    pub speciality_bonus: f64,
    pub all_assigned: bool,
    pub holders: usize,
    pub raw_score: f64,
    pub max_score: f64,
}

/// Split a department label into cleaned lower-case words.
///
/// Separators become spaces, other punctuation and non-breaking spaces are
/// dropped, and stopwords are removed.
pub fn clean_departments(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|&c| c != '\u{a0}')
        .filter_map(|c| match c {
            ',' | ';' | '/' => Some(' '),
            c if c.is_alphanumeric() || c.is_whitespace() => Some(c),
            _ => None,
        })
        .collect::<String>()
        .to_lowercase();

    cleaned
        .split_whitespace()
        .filter(|word| !DEPARTMENT_STOPWORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Ratio of distinct to total entries; zero for an empty list.
fn unique_ratio<T: Eq + std::hash::Hash>(items: &[T]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().unique().count() as f64 / items.len() as f64
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        0.0
    } else {
        values.sum::<f64>() / n as f64
    }
}

/// Accumulates the viability verdict; the last failure recorded is the reported reason.
#[derive(Default)]
struct Verdict {
    reason: Option<NonViableReason>,
    violations: BTreeSet<NonViableReason>,
}

impl Verdict {
    fn fail(&mut self, reason: NonViableReason) {
        self.reason = Some(reason);
        self.violations.insert(reason);
    }
}

/// Scores schedules against one weighting configuration.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    weights: ScoringWeights,
    specialities: Vec<SpecialityCheck>,
}

impl FitnessEvaluator {
    /// Create an evaluator from explicit weights. Disabled speciality checks are ignored.
    pub fn new(weights: ScoringWeights, specialities: &[SpecialityCheck]) -> Self {
        FitnessEvaluator {
            weights,
            specialities: specialities.iter().filter(|c| c.enabled).cloned().collect(),
        }
    }

    /// Create an evaluator using the weights of a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.weights.clone(), &config.specialities)
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Highest achievable raw score for a schedule with the given number of
    /// placements and holders.
    pub fn max_score(&self, placements: usize, holders: usize) -> f64 {
        let w = &self.weights;
        let per_placement = placements as f64 * (w.within_capacity + w.double_booked);
        let speciality: f64 = self
            .specialities
            .iter()
            .map(|check| check.weight * holders as f64)
            .sum();

        per_placement
            + w.all_assigned
            + w.unique_locations
            + w.unique_departments
            + w.capacity_utilisation
            + speciality
    }

    /// Score a schedule, writing fitness, viability, reason and sub-scores onto it.
    ///
    /// The occupancy index is read as is; callers repopulate first when the
    /// placement list has changed.
    pub fn evaluate(&self, assignment: &mut Assignment, problem: &Problem) -> f64 {
        let w = &self.weights;
        let mut verdict = Verdict::default();
        let mut assigned = vec![false; problem.assignable_count()];
        let mut location_visits: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut department_words: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut utilisation = Vec::with_capacity(assignment.placements.len());
        let mut scored_utilisation = Vec::with_capacity(assignment.placements.len());

        let mut placement_total = 0.0;
        let mut capacity_score = 0.0;
        let mut capacity_failed = false;
        let mut double_booked_score = 0.0;
        let mut double_booked_failed = false;

        for placement in &assignment.placements {
            let a = &problem.assignables[placement.assignable];
            assigned[placement.assignable] = true;

            let location_index = problem.location_of(placement.slot_index);
            let location = &problem.locations[location_index];
            let partition_capacity = location.capacity_for(a.partition) as usize;
            let cells = &assignment.occupancy[placement.slot_indices()];
            let mut component = 0.0;

            let within_capacity = cells.iter().all(|cell| {
                let same_partition = cell
                    .iter()
                    .filter(|&&other| problem.assignables[other].partition == a.partition)
                    .count();
                cell.len() <= location.capacity as usize && same_partition <= partition_capacity
            });
            if within_capacity {
                component += w.within_capacity;
                capacity_score += w.within_capacity;
            } else {
                capacity_failed = true;
                verdict.fail(NonViableReason::CapacityExceeded);
            }

            let ratios: Vec<f64> = cells
                .iter()
                .map(|cell| {
                    if location.capacity == 0 {
                        0.0
                    } else {
                        cell.len() as f64 / location.capacity as f64
                    }
                })
                .collect();
            utilisation.push(mean(ratios.iter().copied()));
            scored_utilisation.push(mean(ratios.iter().map(|ratio| ratio.min(1.0))));

            if !a.eligibility.compatible_with(location.risk) {
                component = 0.0;
                verdict.fail(NonViableReason::EligibilityIncompatible);
            }

            let double_booked = (placement.start_week..placement.start_week + placement.duration)
                .any(|week| {
                    (0..problem.location_count())
                        .filter(|&other| other != location_index)
                        .flat_map(|other| assignment.occupants(problem, other, week))
                        .any(|&other| problem.assignables[other].name == a.name)
                });
            if double_booked {
                component = 0.0;
                double_booked_failed = true;
                verdict.fail(NonViableReason::DoubleBooked);
            } else {
                component += w.double_booked;
                double_booked_score += w.double_booked;
            }

            placement_total += component;

            location_visits
                .entry(a.holder())
                .or_insert_with(|| {
                    a.location_history
                        .iter()
                        .map(String::as_str)
                        .filter(|name| !name.trim().is_empty())
                        .collect()
                })
                .push(location.name.as_str());
            department_words
                .entry(a.holder())
                .or_insert_with(|| {
                    a.department_history
                        .iter()
                        .flat_map(|label| clean_departments(label))
                        .collect()
                })
                .extend(clean_departments(&location.department));
        }

        let mean_unique_locations =
            mean(location_visits.values().map(|v| unique_ratio(v.as_slice())));
        let mean_unique_departments =
            mean(department_words.values().map(|v| unique_ratio(v.as_slice())));

        let speciality_bonus: f64 = self
            .specialities
            .iter()
            .map(|check| {
                let holders = department_words
                    .values()
                    .filter(|words| words.iter().any(|word| check.matches(word)))
                    .count();
                holders as f64 * check.weight
            })
            .sum();

        let all_assigned = assigned.iter().all(|&a| a);
        if !all_assigned {
            verdict.fail(NonViableReason::NotAllAssigned);
        }

        let mean_utilisation = mean(utilisation.into_iter());
        // Overfilled cells earn no more than full ones
        let scored_mean_utilisation = mean(scored_utilisation.into_iter());

        let raw_score = placement_total
            + w.unique_locations * mean_unique_locations
            + w.unique_departments * mean_unique_departments
            + speciality_bonus
            + if all_assigned { w.all_assigned } else { 0.0 }
            + w.capacity_utilisation * scored_mean_utilisation;

        let holders = location_visits.len();
        let max_score = self.max_score(assignment.placements.len(), holders);
        let fitness = if max_score > 0.0 {
            (raw_score / max_score).clamp(0.0, 1.0)
        } else {
            0.0
        };

        assignment.scores = EvaluationScores {
            capacity_score: if capacity_failed { 0.0 } else { capacity_score },
            double_booked_score: if double_booked_failed {
                0.0
            } else {
                double_booked_score
            },
            mean_utilisation,
            mean_unique_locations,
            mean_unique_departments,
            speciality_bonus,
            all_assigned,
            holders,
            raw_score,
            max_score,
        };
        assignment.fitness = fitness;
        assignment.viable = Some(verdict.violations.is_empty());
        assignment.non_viable_reason = verdict.reason;
        assignment.violations = verdict.violations;

        fitness
    }
}
