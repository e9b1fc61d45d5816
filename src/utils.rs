//! Utility functions for persisting and displaying schedules.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::assignment::Assignment;
use crate::engine::SearchResult;
use crate::error::Error;
use crate::problem::Problem;
use crate::report::{location_utilisation, schedule_rows, ResultSummary, WeeklyTotals};

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Write one row per (occupant, week) to a CSV file.
pub fn save_schedule_csv<P: AsRef<Path>>(
    assignment: &Assignment,
    problem: &Problem,
    path: P,
) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in schedule_rows(assignment, problem) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write per-location weekly utilisation to a CSV file, one column per week.
pub fn save_utilisation_csv<P: AsRef<Path>>(
    assignment: &Assignment,
    problem: &Problem,
    path: P,
) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["location".to_string(), "capacity".to_string()];
    header.extend((0..problem.num_weeks).map(|week| format!("week_{}", week)));
    header.push("mean".to_string());
    writer.write_record(&header)?;

    for utilisation in location_utilisation(assignment, problem) {
        let mut record = vec![utilisation.location.clone(), utilisation.capacity.to_string()];
        record.extend(utilisation.weekly.iter().map(|u| format!("{:.3}", u)));
        record.push(format!("{:.3}", utilisation.mean()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write labelled per-period rows to a CSV file.
///
/// Columns are named `{column_prefix}_0`, `{column_prefix}_1` and so on after
/// the label column.
pub fn save_weekly_csv<P: AsRef<Path>>(
    rows: &[WeeklyTotals],
    label_header: &str,
    column_prefix: &str,
    path: P,
) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;

    let periods = rows.iter().map(|row| row.values.len()).max().unwrap_or(0);
    let mut header = vec![label_header.to_string()];
    header.extend((0..periods).map(|period| format!("{}_{}", column_prefix, period)));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.label.clone()];
        record.extend(row.values.iter().map(|value| format!("{:.2}", value)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a JSON summary of a search result.
pub fn save_summary_json<P: AsRef<Path>>(result: &SearchResult, path: P) -> Result<(), Error> {
    let mut file = File::create(path)?;
    let summary = ResultSummary::from(result);
    serde_json::to_writer_pretty(&mut file, &summary)?;
    writeln!(file)?;
    Ok(())
}

/// Format search statistics for display.
pub fn format_result(result: &SearchResult) -> String {
    let reason = result
        .non_viable_reason
        .map_or_else(|| "-".to_string(), |r| r.to_string());

    format!(
        "Search Statistics:
- Generations: {}
- Runtime: {}
- Termination: {}
- Fitness: {:.4}
- Viable: {}
- Non-viable reason: {}
- Mean utilisation: {:.3}
- Mean unique locations: {:.3}
- Mean unique departments: {:.3}",
        result.generations,
        format_duration(result.run_time),
        result.termination,
        result.fitness,
        result.viable,
        reason,
        result.scores.mean_utilisation,
        result.scores.mean_unique_locations,
        result.scores.mean_unique_departments
    )
}

/// Print an occupancy grid to console: one row per location, one column per week.
///
/// Each cell shows the number of occupants, or `!` when capacity is exceeded.
pub fn print_schedule_grid(assignment: &Assignment, problem: &Problem) {
    let name_width = problem
        .locations
        .iter()
        .map(|l| l.name.len())
        .max()
        .unwrap_or(0)
        .max(8);

    print!("{:width$} ", "Location", width = name_width);
    for week in 0..problem.num_weeks {
        print!("{}", week % 10);
    }
    println!();

    for (index, location) in problem.locations.iter().enumerate() {
        print!("{:width$} ", location.name, width = name_width);
        for week in 0..problem.num_weeks {
            let occupants = assignment.occupants(problem, index, week).len();
            let symbol = match occupants {
                0 => '.',
                n if n > location.capacity as usize => '!',
                n => std::char::from_digit((n % 10) as u32, 10).unwrap_or('#'),
            };
            print!("{}", symbol);
        }
        println!();
    }
    println!();

    println!("Legend:");
    println!(". - Empty");
    println!("n - Occupants (mod 10)");
    println!("! - Over capacity");
    println!();
}
