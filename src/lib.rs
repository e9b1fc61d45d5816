//! # Placement GA
//!
//! A genetic-algorithm scheduler that assigns time-bound placements to
//! capacity-constrained locations over a multi-week horizon.
//!
//! Hard constraints (capacity, eligibility, no double booking, every placement
//! assigned) decide a schedule's viability. A normalised weighted score in
//! [0, 1] additionally rewards variety of locations and departments per
//! holder and capacity utilisation. The search evolves a population of
//! complete schedules through refresh, mutation and recombination until a
//! viable schedule clears the fitness threshold or progress stagnates.
//!
//! ```no_run
//! use placement_ga::{Config, Problem, SearchEngine};
//!
//! let problem = Problem::from_file("instance.json")?;
//! let config = Config::new().with_seed(7).with_population_size(40);
//! let mut engine = SearchEngine::new(problem, config)?;
//! let result = engine.run();
//! println!("fitness {:.3}, viable {}", result.fitness, result.viable);
//! # Ok::<(), placement_ga::error::Error>(())
//! ```

pub mod assignment;
pub mod config;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod genetic;
pub mod individual;
pub mod population;
pub mod problem;
pub mod quality;
pub mod report;
pub mod utils;

pub use crate::assignment::{Assignment, ConfirmedPlacement, NonViableReason};
pub use crate::config::{Config, ScoringWeights, SpecialityCheck};
pub use crate::engine::{
    GenerationSnapshot, NoopObserver, SearchEngine, SearchObserver, SearchResult, StopHandle,
    Termination,
};
pub use crate::error::Error;
pub use crate::fitness::FitnessEvaluator;
pub use crate::problem::{Assignable, Location, Partition, Problem, RiskLevel};
pub use crate::quality::QualityReport;
