//! Problem definition: locations, assignables and the scheduling horizon.

use crate::error::{Error, ProblemError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Separates the holder identifier from the block identifier in a display name.
pub const HOLDER_DELIMITER: char = '_';

/// Cohort partition of an assignable, each with its own sub-capacity per location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Partition {
    P1,
    P2,
    P3,
    #[serde(other)]
    Other,
}

impl Partition {
    /// The three partitions with a dedicated sub-capacity.
    pub const TRACKED: [Partition; 3] = [Partition::P1, Partition::P2, Partition::P3];
}

/// Risk / eligibility status shared by locations and assignables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low/Medium")]
    LowMedium,
    #[serde(rename = "Medium/High")]
    MediumHigh,
}

impl RiskLevel {
    /// Whether an assignable with this eligibility may occupy a location of `location` risk.
    pub fn compatible_with(self, location: RiskLevel) -> bool {
        !(self == RiskLevel::LowMedium && location == RiskLevel::MediumHigh)
    }
}

/// A capacity-bounded destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: usize,
    pub name: String,
    pub department: String,
    /// Week (relative to the earliest placement start) after which the audit lapses
    pub audit_expiry_week: i64,
    pub risk: RiskLevel,
    pub capacity: u32,
    pub p1_capacity: u32,
    pub p2_capacity: u32,
    pub p3_capacity: u32,
}

impl Location {
    /// Create a new location.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        name: &str,
        department: &str,
        audit_expiry_week: i64,
        risk: RiskLevel,
        capacity: u32,
        p1_capacity: u32,
        p2_capacity: u32,
        p3_capacity: u32,
    ) -> Self {
        Location {
            id,
            name: name.to_string(),
            department: department.to_string(),
            audit_expiry_week,
            risk,
            capacity,
            p1_capacity,
            p2_capacity,
            p3_capacity,
        }
    }

    /// Capacity applicable to a partition; the overall capacity for untracked partitions.
    pub fn capacity_for(&self, partition: Partition) -> u32 {
        match partition {
            Partition::P1 => self.p1_capacity,
            Partition::P2 => self.p2_capacity,
            Partition::P3 => self.p3_capacity,
            Partition::Other => self.capacity,
        }
    }

    /// Whether the audit has lapsed by the end of an occupation.
    pub fn audit_expired_for(&self, start_week: usize, duration: usize) -> bool {
        self.audit_expiry_week <= (start_week + duration) as i64
    }
}

/// The thing being scheduled: one block of one holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignable {
    pub id: usize,
    /// `<holder>_<block>`
    pub name: String,
    pub cohort: String,
    /// Whole weeks, at least one
    pub duration: usize,
    /// Desired start week, 0-indexed
    pub start_week: usize,
    /// Raw start date, carried through for reporting
    pub start_date: String,
    pub partition: Partition,
    /// Locations visited before this schedule
    #[serde(default)]
    pub location_history: Vec<String>,
    /// Department labels visited before this schedule
    #[serde(default)]
    pub department_history: Vec<String>,
    pub eligibility: RiskLevel,
}

impl Assignable {
    /// Create a new assignable with empty histories.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        name: &str,
        cohort: &str,
        duration: usize,
        start_week: usize,
        start_date: &str,
        partition: Partition,
        eligibility: RiskLevel,
    ) -> Self {
        Assignable {
            id,
            name: name.to_string(),
            cohort: cohort.to_string(),
            duration,
            start_week,
            start_date: start_date.to_string(),
            partition,
            location_history: Vec::new(),
            department_history: Vec::new(),
            eligibility,
        }
    }

    /// Attach visit histories.
    pub fn with_history(mut self, locations: &[&str], departments: &[&str]) -> Self {
        self.location_history = locations.iter().map(|s| s.to_string()).collect();
        self.department_history = departments.iter().map(|s| s.to_string()).collect();
        self
    }

    /// The holder identifier: the display name up to the first delimiter.
    pub fn holder(&self) -> &str {
        self.name
            .split_once(HOLDER_DELIMITER)
            .map_or(self.name.as_str(), |(holder, _)| holder)
    }

    /// The block identifier: the display name after the first delimiter.
    pub fn block(&self) -> &str {
        self.name
            .split_once(HOLDER_DELIMITER)
            .map_or("", |(_, block)| block)
    }

    /// First week after the occupation ends.
    pub fn end_week(&self) -> usize {
        self.start_week + self.duration
    }
}

/// On-disk shape of a problem instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProblemData {
    num_weeks: usize,
    locations: Vec<Location>,
    assignables: Vec<Assignable>,
}

/// A validated scheduling instance. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub locations: Vec<Location>,
    pub assignables: Vec<Assignable>,
    pub num_weeks: usize,
}

impl Problem {
    /// Create a new problem, checking that location ids are positional and that
    /// every occupation fits in the horizon.
    pub fn new(
        locations: Vec<Location>,
        assignables: Vec<Assignable>,
        num_weeks: usize,
    ) -> Result<Self, ProblemError> {
        if num_weeks == 0 {
            return Err(ProblemError::EmptyHorizon);
        }
        if locations.is_empty() && !assignables.is_empty() {
            return Err(ProblemError::NoLocations {
                assignables: assignables.len(),
            });
        }
        if let Some((position, location)) = locations
            .iter()
            .enumerate()
            .find(|(position, location)| location.id != *position)
        {
            return Err(ProblemError::NonPositionalLocation {
                position,
                id: location.id,
            });
        }
        for assignable in &assignables {
            if assignable.duration == 0 {
                return Err(ProblemError::ZeroDuration {
                    name: assignable.name.clone(),
                });
            }
            if assignable.end_week() > num_weeks {
                return Err(ProblemError::HorizonExceeded {
                    name: assignable.name.clone(),
                    start: assignable.start_week,
                    duration: assignable.duration,
                    num_weeks,
                });
            }
        }

        Ok(Problem {
            locations,
            assignables,
            num_weeks,
        })
    }

    /// Load a problem from a JSON file with `num_weeks`, `locations` and `assignables`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        let data: ProblemData = serde_json::from_str(&text)?;
        Ok(Problem::new(data.locations, data.assignables, data.num_weeks)?)
    }

    /// Flat occupancy index of a (location, week) cell.
    pub fn slot_index(&self, location: usize, week: usize) -> usize {
        location * self.num_weeks + week
    }

    /// Location owning a flat occupancy index.
    pub fn location_of(&self, slot_index: usize) -> usize {
        slot_index / self.num_weeks
    }

    /// Week of a flat occupancy index.
    pub fn week_of(&self, slot_index: usize) -> usize {
        slot_index % self.num_weeks
    }

    /// Number of occupancy cells.
    pub fn total_slots(&self) -> usize {
        self.locations.len() * self.num_weeks
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn assignable_count(&self) -> usize {
        self.assignables.len()
    }
}
