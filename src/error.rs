//! Error types for configuration, problem construction and persistence.
//!
//! Constraint violations found while scoring a schedule are not errors: they
//! are recorded on the [`Assignment`](crate::assignment::Assignment) itself.

use thiserror::Error;

/// Invalid search or scoring parameters. Raised when a [`Config`](crate::config::Config)
/// is validated, before any search work starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },
    #[error("scoring weight {name} must be finite and non-negative, got {value}")]
    InvalidWeight { name: String, value: f64 },
    #[error("population size must be positive")]
    EmptyPopulation,
    #[error("crossover points must be at least 1")]
    NoCrossoverPoints,
    #[error("crossover points ({points}) must be smaller than the population size ({population})")]
    TooManyCrossoverPoints { points: usize, population: usize },
    #[error("stagnation limit must be at least one generation")]
    ZeroStagnationLimit,
}

/// Malformed problem catalogs handed over by the data loader.
#[derive(Debug, Error, PartialEq)]
pub enum ProblemError {
    #[error("the scheduling horizon must cover at least one week")]
    EmptyHorizon,
    #[error("{assignables} assignables were supplied but there are no locations")]
    NoLocations { assignables: usize },
    #[error("location at position {position} has id {id}; location ids must be positional")]
    NonPositionalLocation { position: usize, id: usize },
    #[error("assignable {name} has a duration of zero weeks")]
    ZeroDuration { name: String },
    #[error("assignable {name} starts in week {start} for {duration} weeks, past the {num_weeks}-week horizon")]
    HorizonExceeded {
        name: String,
        start: usize,
        duration: usize,
        num_weeks: usize,
    },
    #[error("placement refers to assignable {index} but only {count} exist")]
    UnknownAssignable { index: usize, count: usize },
    #[error("placement of assignable {assignable} at slot {slot_index} (week {start_week}, {duration} weeks) does not fit the occupancy index")]
    MisplacedPlacement {
        assignable: usize,
        slot_index: usize,
        start_week: usize,
        duration: usize,
    },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
