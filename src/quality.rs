//! Post-search quality checks on a schedule's occupancy index.
//!
//! These counts are for reporting. They do not feed back into viability.

use crate::assignment::Assignment;
use crate::problem::{Partition, Problem};
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Counts of schedule defects found by [`QualityReport::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Holders whose number of occupied blocks differs from the number they own
    pub wrong_placement_count: usize,
    /// Blocks whose number of occupied weeks differs from their duration
    pub wrong_length: usize,
    /// Over-capacity cells, counted per (location, week) and per (location, partition, week)
    pub capacity_exceeded: usize,
    /// Blocks present at more than one location
    pub double_booked: usize,
    /// (block, location) pairs where the location's audit lapses before the block ends
    pub expired_audit: usize,
}

impl QualityReport {
    /// Walk the occupancy index and count defects.
    pub fn check(assignment: &Assignment, problem: &Problem) -> Self {
        // Per display name: occupied weeks and locations
        let mut weeks: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
        let mut locations: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
        let mut expired: BTreeSet<(&str, usize)> = BTreeSet::new();
        let mut capacity_exceeded = 0;

        for (slot, cell) in assignment.occupancy.iter().enumerate() {
            let location_index = problem.location_of(slot);
            let week = problem.week_of(slot);
            let location = &problem.locations[location_index];

            if cell.len() > location.capacity as usize {
                capacity_exceeded += 1;
            }
            let per_partition = cell
                .iter()
                .map(|&i| problem.assignables[i].partition)
                .counts();
            capacity_exceeded += Partition::TRACKED
                .iter()
                .filter(|&&p| {
                    per_partition.get(&p).copied().unwrap_or(0) > location.capacity_for(p) as usize
                })
                .count();

            for &i in cell {
                let a = &problem.assignables[i];
                weeks.entry(a.name.as_str()).or_default().insert(week);
                locations
                    .entry(a.name.as_str())
                    .or_default()
                    .insert(location_index);
                if location.audit_expired_for(a.start_week, a.duration) {
                    expired.insert((a.name.as_str(), location_index));
                }
            }
        }

        let durations: HashMap<&str, usize> = problem
            .assignables
            .iter()
            .map(|a| (a.name.as_str(), a.duration))
            .into_grouping_map()
            .max();
        let wrong_length = weeks
            .iter()
            .filter(|(name, occupied)| durations.get(*name) != Some(&occupied.len()))
            .count();

        let expected_blocks = problem
            .assignables
            .iter()
            .map(|a| (a.holder(), a.name.as_str()))
            .into_group_map();
        let present_blocks = weeks
            .keys()
            .filter_map(|name| {
                problem
                    .assignables
                    .iter()
                    .find(|a| a.name == *name)
                    .map(|a| (a.holder(), *name))
            })
            .into_group_map();
        let wrong_placement_count = expected_blocks
            .iter()
            .filter(|(holder, blocks)| {
                let expected = blocks.iter().unique().count();
                let present = present_blocks.get(*holder).map_or(0, |b| b.len());
                expected != present
            })
            .count();

        let double_booked = locations.values().filter(|l| l.len() > 1).count();

        let report = QualityReport {
            wrong_placement_count,
            wrong_length,
            capacity_exceeded,
            double_booked,
            expired_audit: expired.len(),
        };
        report.log();
        report
    }

    /// Whether no defect was found.
    pub fn is_clean(&self) -> bool {
        *self == QualityReport::default()
    }

    fn log(&self) {
        info!(
            "{} holders have the incorrect number of placements",
            self.wrong_placement_count
        );
        info!("{} placements are the incorrect length", self.wrong_length);
        info!(
            "{} location-weeks have their capacity exceeded",
            self.capacity_exceeded
        );
        info!(
            "{} placements are assigned to more than one location",
            self.double_booked
        );
        info!(
            "{} placements fall on locations with an expired audit",
            self.expired_audit
        );
    }
}
