//! Command-line runner: load an instance, search, and write the schedule.

use clap::Parser;
use log::LevelFilter;
use placement_ga::engine::{GenerationSnapshot, SearchObserver};
use placement_ga::report::{cohort_hours, location_hours, quarterly_utilisation};
use placement_ga::utils::{
    format_result, print_schedule_grid, save_schedule_csv, save_summary_json, save_utilisation_csv,
    save_weekly_csv,
};
use placement_ga::{Config, Problem, SearchEngine};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "placement-ga", version, about = "Genetic-algorithm placement scheduler")]
struct Args {
    /// Problem instance (JSON with num_weeks, locations and assignables)
    #[arg(short, long)]
    instance: PathBuf,

    /// Search configuration (JSON); defaults are used for missing fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the population size
    #[arg(short, long)]
    population: Option<usize>,

    /// Directory receiving the schedule, utilisation and hours CSV files and summary.json
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Log per-generation progress
    #[arg(short, long)]
    verbose: bool,
}

/// Prints a progress line every few generations.
struct ProgressPrinter {
    every: u32,
}

impl SearchObserver for ProgressPrinter {
    fn on_generation(&mut self, snapshot: &GenerationSnapshot) {
        if snapshot.iteration % self.every == 0 {
            println!(
                "Generation {:>5}: best {:.4}, stagnant for {}",
                snapshot.iteration, snapshot.best_fitness, snapshot.stagnation
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    println!("Loading problem from: {}", args.instance.display());
    let problem = Problem::from_file(&args.instance)?;
    println!(
        "Loaded problem with {} assignables, {} locations and {} weeks",
        problem.assignable_count(),
        problem.location_count(),
        problem.num_weeks
    );

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::new(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(size) = args.population {
        config = config.with_population_size(size);
    }

    let mut engine = SearchEngine::new(problem, config)?;
    let result = engine.run_with_observer(&mut ProgressPrinter { every: 10 });

    println!("{}", format_result(&result));
    println!("{:?}", result.quality);
    print_schedule_grid(&result.assignment, engine.problem());

    fs::create_dir_all(&args.output)?;
    save_schedule_csv(
        &result.assignment,
        engine.problem(),
        args.output.join("schedule.csv"),
    )?;
    save_utilisation_csv(
        &result.assignment,
        engine.problem(),
        args.output.join("utilisation.csv"),
    )?;
    save_weekly_csv(
        &location_hours(&result.assignment, engine.problem()),
        "location",
        "week",
        args.output.join("location_hours.csv"),
    )?;
    save_weekly_csv(
        &cohort_hours(&result.assignment, engine.problem()),
        "cohort",
        "week",
        args.output.join("cohort_hours.csv"),
    )?;
    save_weekly_csv(
        &quarterly_utilisation(&result.assignment, engine.problem()),
        "location",
        "quarter",
        args.output.join("quarterly_utilisation.csv"),
    )?;
    save_summary_json(&result, args.output.join("summary.json"))?;
    println!("Results written to: {}", args.output.display());

    Ok(())
}
