//! Tests for the post-search quality counts.

use placement_ga::assignment::{Assignment, ConfirmedPlacement};
use placement_ga::problem::{Assignable, Location, Partition, Problem, RiskLevel};
use placement_ga::quality::QualityReport;

fn create_test_problem(audit_expiry_week: i64) -> Problem {
    Problem::new(
        vec![
            Location::new(0, "WardA", "Cardiology", audit_expiry_week, RiskLevel::LowMedium, 2, 1, 2, 2),
            Location::new(1, "WardB", "Neurology", 52, RiskLevel::LowMedium, 1, 1, 1, 1),
        ],
        vec![
            Assignable::new(0, "A_1", "C", 2, 0, "2020-01-06", Partition::P1, RiskLevel::LowMedium),
            Assignable::new(1, "A_2", "C", 2, 2, "2020-01-20", Partition::P1, RiskLevel::LowMedium),
            Assignable::new(2, "B_1", "C", 2, 0, "2020-01-06", Partition::P1, RiskLevel::LowMedium),
        ],
        4,
    )
    .unwrap()
}

fn placement(problem: &Problem, assignable: usize, location: usize) -> ConfirmedPlacement {
    let a = &problem.assignables[assignable];
    ConfirmedPlacement {
        assignable,
        slot_index: problem.slot_index(location, a.start_week),
        start_week: a.start_week,
        duration: a.duration,
    }
}

#[test]
fn test_clean_schedule_has_no_defects() {
    let problem = create_test_problem(52);
    let assignment = Assignment::from_placements(
        &problem,
        vec![
            placement(&problem, 0, 0),
            placement(&problem, 1, 1),
            placement(&problem, 2, 1),
        ],
    )
    .unwrap();

    let report = QualityReport::check(&assignment, &problem);

    assert!(report.is_clean(), "{:?}", report);
}

#[test]
fn test_partition_overflow_counts_per_week() {
    let problem = create_test_problem(52);

    // Two P1 occupants in WardA for two weeks: overall 2 fits, P1 capacity 1 does not
    let assignment = Assignment::from_placements(
        &problem,
        vec![
            placement(&problem, 0, 0),
            placement(&problem, 1, 1),
            placement(&problem, 2, 0),
        ],
    )
    .unwrap();

    let report = QualityReport::check(&assignment, &problem);

    assert_eq!(report.capacity_exceeded, 2);
    assert_eq!(report.double_booked, 0);
}

#[test]
fn test_missing_block_counts_holder_and_length() {
    let problem = create_test_problem(52);

    // A_2 is never placed
    let assignment = Assignment::from_placements(
        &problem,
        vec![placement(&problem, 0, 0), placement(&problem, 2, 1)],
    )
    .unwrap();

    let report = QualityReport::check(&assignment, &problem);

    assert_eq!(report.wrong_placement_count, 1);
    assert_eq!(report.wrong_length, 0);
}

#[test]
fn test_extra_weeks_count_as_wrong_length() {
    let problem = create_test_problem(52);
    let mut assignment = Assignment::from_placements(
        &problem,
        vec![
            placement(&problem, 0, 0),
            placement(&problem, 1, 1),
            placement(&problem, 2, 1),
        ],
    )
    .unwrap();

    // B_1 also appears in WardA in week 3
    assignment.occupy(&problem, 0, 3, 2);

    let report = QualityReport::check(&assignment, &problem);

    assert_eq!(report.wrong_length, 1);
    assert_eq!(report.double_booked, 1);
}

#[test]
fn test_expired_audit_is_counted_once_per_location() {
    // WardA's audit lapses in week 2, before A_1 (weeks 0-1) ends
    let problem = create_test_problem(2);
    let assignment = Assignment::from_placements(
        &problem,
        vec![
            placement(&problem, 0, 0),
            placement(&problem, 1, 1),
            placement(&problem, 2, 1),
        ],
    )
    .unwrap();

    let report = QualityReport::check(&assignment, &problem);

    assert_eq!(report.expired_audit, 1);
    assert_eq!(report.capacity_exceeded, 0);
}
