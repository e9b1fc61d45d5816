//! Flat views of a finished search for export and display.

use crate::assignment::Assignment;
use crate::engine::{SearchResult, Termination};
use crate::fitness::EvaluationScores;
use crate::problem::{Partition, Problem};
use crate::quality::QualityReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hours credited for one occupant-week.
pub const HOURS_PER_WEEK: f64 = 37.5;

/// Weeks in one reporting quarter.
pub const WEEKS_PER_QUARTER: usize = 13;

/// One occupant of one (location, week) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub name: String,
    pub holder: String,
    pub block: String,
    pub cohort: String,
    pub partition: Partition,
    pub start_week: usize,
    pub start_date: String,
    pub week: usize,
    pub duration: usize,
    pub location: String,
    pub department: String,
    pub capacity: u32,
    pub p1_capacity: u32,
    pub p2_capacity: u32,
    pub p3_capacity: u32,
    pub audit_expiry_week: i64,
}

/// Expand a schedule's occupancy index into rows sorted by name, start week
/// and week.
pub fn schedule_rows(assignment: &Assignment, problem: &Problem) -> Vec<ScheduleRow> {
    let mut rows: Vec<ScheduleRow> = assignment
        .occupancy
        .iter()
        .enumerate()
        .flat_map(|(slot, cell)| {
            let location = &problem.locations[problem.location_of(slot)];
            let week = problem.week_of(slot);
            cell.iter().map(move |&i| {
                let a = &problem.assignables[i];
                ScheduleRow {
                    name: a.name.clone(),
                    holder: a.holder().to_string(),
                    block: a.block().to_string(),
                    cohort: a.cohort.clone(),
                    partition: a.partition,
                    start_week: a.start_week,
                    start_date: a.start_date.clone(),
                    week,
                    duration: a.duration,
                    location: location.name.clone(),
                    department: location.department.clone(),
                    capacity: location.capacity,
                    p1_capacity: location.p1_capacity,
                    p2_capacity: location.p2_capacity,
                    p3_capacity: location.p3_capacity,
                    audit_expiry_week: location.audit_expiry_week,
                }
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.name, a.start_week, a.week).cmp(&(&b.name, b.start_week, b.week))
    });
    rows
}

/// Weekly occupancy of one location as a fraction of its capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUtilisation {
    pub location: String,
    pub capacity: u32,
    /// One entry per week; zero for zero-capacity locations
    pub weekly: Vec<f64>,
}

impl LocationUtilisation {
    /// Mean over the horizon.
    pub fn mean(&self) -> f64 {
        if self.weekly.is_empty() {
            0.0
        } else {
            self.weekly.iter().sum::<f64>() / self.weekly.len() as f64
        }
    }
}

/// Per-location weekly utilisation of a schedule. Values above 1 indicate
/// over-capacity weeks.
pub fn location_utilisation(assignment: &Assignment, problem: &Problem) -> Vec<LocationUtilisation> {
    problem
        .locations
        .iter()
        .enumerate()
        .map(|(index, location)| {
            let weekly = (0..problem.num_weeks)
                .map(|week| {
                    let occupants = assignment.occupants(problem, index, week).len();
                    if location.capacity == 0 {
                        0.0
                    } else {
                        occupants as f64 / location.capacity as f64
                    }
                })
                .collect();
            LocationUtilisation {
                location: location.name.clone(),
                capacity: location.capacity,
                weekly,
            }
        })
        .collect()
}

/// A labelled row of per-period values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTotals {
    pub label: String,
    pub values: Vec<f64>,
}

/// Occupant hours per location and week.
pub fn location_hours(assignment: &Assignment, problem: &Problem) -> Vec<WeeklyTotals> {
    problem
        .locations
        .iter()
        .enumerate()
        .map(|(index, location)| WeeklyTotals {
            label: location.name.clone(),
            values: (0..problem.num_weeks)
                .map(|week| {
                    assignment.occupants(problem, index, week).len() as f64 * HOURS_PER_WEEK
                })
                .collect(),
        })
        .collect()
}

/// Occupant hours per cohort and week, sorted by cohort. Only cohorts with at
/// least one occupant appear.
pub fn cohort_hours(assignment: &Assignment, problem: &Problem) -> Vec<WeeklyTotals> {
    let mut totals: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (slot, cell) in assignment.occupancy.iter().enumerate() {
        let week = problem.week_of(slot);
        for &i in cell {
            let row = totals
                .entry(problem.assignables[i].cohort.as_str())
                .or_insert_with(|| vec![0.0; problem.num_weeks]);
            row[week] += HOURS_PER_WEEK;
        }
    }

    totals
        .into_iter()
        .map(|(cohort, values)| WeeklyTotals {
            label: cohort.to_string(),
            values,
        })
        .collect()
}

/// Mean utilisation per location over each block of [`WEEKS_PER_QUARTER`] weeks.
///
/// Only weeks with at least one occupant are averaged; a quarter without any
/// reports zero. The last quarter may be shorter than the others.
pub fn quarterly_utilisation(assignment: &Assignment, problem: &Problem) -> Vec<WeeklyTotals> {
    location_utilisation(assignment, problem)
        .into_iter()
        .enumerate()
        .map(|(index, utilisation)| {
            let values = utilisation
                .weekly
                .chunks(WEEKS_PER_QUARTER)
                .enumerate()
                .map(|(quarter, weeks)| {
                    let first_week = quarter * WEEKS_PER_QUARTER;
                    let occupied: Vec<f64> = weeks
                        .iter()
                        .enumerate()
                        .filter(|&(offset, _)| {
                            !assignment
                                .occupants(problem, index, first_week + offset)
                                .is_empty()
                        })
                        .map(|(_, &value)| value)
                        .collect();
                    if occupied.is_empty() {
                        0.0
                    } else {
                        occupied.iter().sum::<f64>() / occupied.len() as f64
                    }
                })
                .collect();
            WeeklyTotals {
                label: utilisation.location,
                values,
            }
        })
        .collect()
}

/// Serializable summary of a search result.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub fitness: f64,
    pub viable: bool,
    /// Display text of the non-viable reason
    pub non_viable_reason: Option<String>,
    pub violations: Vec<String>,
    pub generation: u32,
    pub generations: u32,
    pub termination: Termination,
    pub run_time_secs: f64,
    pub scores: EvaluationScores,
    pub quality: QualityReport,
}

impl From<&SearchResult> for ResultSummary {
    fn from(result: &SearchResult) -> Self {
        ResultSummary {
            fitness: result.fitness,
            viable: result.viable,
            non_viable_reason: result.non_viable_reason.map(|r| r.to_string()),
            violations: result
                .assignment
                .violations
                .iter()
                .map(|r| r.to_string())
                .collect(),
            generation: result.assignment.generation,
            generations: result.generations,
            termination: result.termination,
            run_time_secs: result.run_time.as_secs_f64(),
            scores: result.scores.clone(),
            quality: result.quality.clone(),
        }
    }
}
