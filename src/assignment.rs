//! Candidate schedule representation.
//!
//! An [`Assignment`] holds one confirmed placement per assignable plus an
//! occupancy index: a flat `locations * num_weeks` table whose cell
//! [`Problem::slot_index`] lists the assignables present at that location in
//! that week. The index is always derivable from the confirmed placements;
//! [`Assignment::repopulate`] rebuilds it and must run after any change to the
//! placement list.

use crate::error::ProblemError;
use crate::fitness::EvaluationScores;
use crate::problem::Problem;
use log::warn;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Where and when one assignable was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedPlacement {
    /// Index into [`Problem::assignables`]
    pub assignable: usize,
    /// Flat occupancy index of the first week
    pub slot_index: usize,
    pub start_week: usize,
    pub duration: usize,
}

impl ConfirmedPlacement {
    /// Flat indices of every occupied week.
    pub fn slot_indices(&self) -> std::ops::Range<usize> {
        self.slot_index..self.slot_index + self.duration
    }

    /// Check that the placement refers to a known assignable and stays inside
    /// one location's row of the occupancy index.
    pub fn validate(&self, problem: &Problem) -> Result<(), ProblemError> {
        if self.assignable >= problem.assignable_count() {
            return Err(ProblemError::UnknownAssignable {
                index: self.assignable,
                count: problem.assignable_count(),
            });
        }
        let fits_row = self.slot_index < problem.total_slots()
            && problem.week_of(self.slot_index) == self.start_week
            && self.start_week + self.duration <= problem.num_weeks;
        if !fits_row {
            return Err(ProblemError::MisplacedPlacement {
                assignable: self.assignable,
                slot_index: self.slot_index,
                start_week: self.start_week,
                duration: self.duration,
            });
        }
        Ok(())
    }
}

/// Hard constraint that made a schedule non-viable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NonViableReason {
    CapacityExceeded,
    EligibilityIncompatible,
    DoubleBooked,
    NotAllAssigned,
}

impl fmt::Display for NonViableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NonViableReason::CapacityExceeded => "capacity exceeded",
            NonViableReason::EligibilityIncompatible => "eligibility incompatible",
            NonViableReason::DoubleBooked => "double booked",
            NonViableReason::NotAllAssigned => "not all assigned",
        };
        f.write_str(text)
    }
}

/// One complete candidate schedule.
#[derive(Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// One entry per assignable once generated
    pub placements: Vec<ConfirmedPlacement>,
    /// Assignable indices per (location, week) cell
    pub occupancy: Vec<Vec<usize>>,
    pub generation: u32,
    /// Stale until the evaluator runs
    pub fitness: f64,
    /// `None` until evaluated
    pub viable: Option<bool>,
    /// Last violation recorded by the evaluator
    pub non_viable_reason: Option<NonViableReason>,
    /// Every kind of violation recorded by the evaluator
    pub violations: BTreeSet<NonViableReason>,
    pub scores: EvaluationScores,
}

impl Assignment {
    /// Create an empty schedule sized for the problem.
    pub fn new(problem: &Problem) -> Self {
        Assignment {
            placements: Vec::with_capacity(problem.assignable_count()),
            occupancy: vec![Vec::new(); problem.total_slots()],
            generation: 1,
            fitness: 0.0,
            viable: None,
            non_viable_reason: None,
            violations: BTreeSet::new(),
            scores: EvaluationScores::default(),
        }
    }

    /// Build a schedule from an explicit placement list.
    ///
    /// Every placement must name an existing assignable and start at its own
    /// week within one location's row of the occupancy index.
    pub fn from_placements(
        problem: &Problem,
        placements: Vec<ConfirmedPlacement>,
    ) -> Result<Self, ProblemError> {
        for placement in &placements {
            placement.validate(problem)?;
        }
        Ok(Self::from_valid_placements(problem, placements))
    }

    /// Build a schedule from placements already known to fit the problem.
    pub(crate) fn from_valid_placements(
        problem: &Problem,
        placements: Vec<ConfirmedPlacement>,
    ) -> Self {
        let mut assignment = Assignment::new(problem);
        assignment.placements = placements;
        assignment.repopulate();
        assignment
    }

    /// Create and randomly generate a schedule.
    pub fn random<R: Rng + ?Sized>(problem: &Problem, rng: &mut R) -> Self {
        let mut assignment = Assignment::new(problem);
        assignment.generate(problem, rng);
        assignment
    }

    /// Place every assignable at a random feasible location.
    ///
    /// Placements from an earlier call are withdrawn first; occupants added
    /// with [`Assignment::occupy`] stay. Locations are tried in random order
    /// without replacement. When none is feasible the assignable goes to a
    /// uniformly random location and a warning is logged. Returns the number
    /// of such fallbacks.
    pub fn generate<R: Rng + ?Sized>(&mut self, problem: &Problem, rng: &mut R) -> usize {
        self.withdraw_placements();

        let mut fallbacks = 0;
        let mut order: Vec<usize> = (0..problem.location_count()).collect();

        for assignable in 0..problem.assignable_count() {
            order.shuffle(rng);
            let location = match order
                .iter()
                .copied()
                .find(|&location| self.fits(problem, assignable, location))
            {
                Some(location) => location,
                None => {
                    warn!(
                        "No valid location is available for {}, random location assigned",
                        problem.assignables[assignable].name
                    );
                    fallbacks += 1;
                    rng.gen_range(0..problem.location_count())
                }
            };
            self.place(problem, assignable, location);
        }

        fallbacks
    }

    /// Check whether an assignable can occupy a location for its whole duration
    /// given the occupants already committed.
    pub fn fits(&self, problem: &Problem, assignable: usize, location: usize) -> bool {
        let a = &problem.assignables[assignable];
        let loc = &problem.locations[location];

        let partition_capacity = loc.capacity_for(a.partition) as usize;
        if partition_capacity == 0 {
            return false;
        }
        if !a.eligibility.compatible_with(loc.risk) {
            return false;
        }

        let start = problem.slot_index(location, a.start_week);
        self.occupancy[start..start + a.duration].iter().all(|cell| {
            let same_partition = cell
                .iter()
                .filter(|&&other| problem.assignables[other].partition == a.partition)
                .count();
            cell.len() < loc.capacity as usize && same_partition < partition_capacity
        })
    }

    /// Commit an assignable to a location from its desired start week.
    pub fn place(&mut self, problem: &Problem, assignable: usize, location: usize) {
        let a = &problem.assignables[assignable];
        let placement = ConfirmedPlacement {
            assignable,
            slot_index: problem.slot_index(location, a.start_week),
            start_week: a.start_week,
            duration: a.duration,
        };
        for index in placement.slot_indices() {
            self.occupancy[index].push(assignable);
        }
        self.placements.push(placement);
    }

    /// Add an occupant to a single cell without recording a placement.
    ///
    /// Used to pre-load existing commitments; [`Assignment::repopulate`] discards it.
    pub fn occupy(&mut self, problem: &Problem, location: usize, week: usize, assignable: usize) {
        let index = problem.slot_index(location, week);
        self.occupancy[index].push(assignable);
    }

    /// Remove every confirmed placement and its occupancy entries.
    fn withdraw_placements(&mut self) {
        for placement in self.placements.drain(..) {
            for index in placement.slot_indices() {
                let cell = &mut self.occupancy[index];
                if let Some(position) = cell.iter().position(|&i| i == placement.assignable) {
                    cell.remove(position);
                }
            }
        }
    }

    /// Rebuild the occupancy index from the confirmed placements.
    pub fn repopulate(&mut self) {
        for cell in self.occupancy.iter_mut() {
            cell.clear();
        }
        for placement in &self.placements {
            for index in placement.slot_indices() {
                self.occupancy[index].push(placement.assignable);
            }
        }
    }

    /// Viability verdict, treating an unevaluated schedule as non-viable.
    pub fn is_viable(&self) -> bool {
        self.viable == Some(true)
    }

    /// Occupants of a (location, week) cell.
    pub fn occupants(&self, problem: &Problem, location: usize, week: usize) -> &[usize] {
        &self.occupancy[problem.slot_index(location, week)]
    }

    pub fn placement_count(&self) -> usize {
        self.placements.len()
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Assignment:")?;
        writeln!(f, "  Generation: {}", self.generation)?;
        writeln!(f, "  Fitness: {:.4}", self.fitness)?;
        writeln!(f, "  Viable: {:?}", self.viable)?;
        if let Some(reason) = self.non_viable_reason {
            writeln!(f, "  Non-viable reason: {}", reason)?;
        }
        writeln!(f, "  Placements: {}", self.placements.len())?;
        for placement in &self.placements {
            writeln!(
                f,
                "  #{} -> slot {} (week {}, {} weeks)",
                placement.assignable, placement.slot_index, placement.start_week, placement.duration
            )?;
        }
        Ok(())
    }
}
