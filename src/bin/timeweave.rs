//! CLI entry point for the `timeweave` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use timeweave::cli::commands;
use timeweave::types::TimeUnit;

#[derive(Parser)]
#[command(
    name = "timeweave",
    about = "Timeweave CLI — temporal reasoning for planning and scheduling"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the Allen relation between two intervals
    Classify {
        /// First interval start (ISO-8601)
        a_start: String,
        /// First interval end (ISO-8601)
        a_end: String,
        /// Second interval start (ISO-8601)
        b_start: String,
        /// Second interval end (ISO-8601)
        b_end: String,
        /// Unit for the lowered bound: microsecond, millisecond, second, minute, hour, day
        #[arg(long, default_value = "second")]
        unit: String,
    },
    /// Solve a JSON plan file and print assigned times
    Solve {
        /// Path to the plan file
        file: PathBuf,
    },
    /// Segment a JSON plan file along its bridges
    Segment {
        /// Path to the plan file
        file: PathBuf,
    },
    /// List the 13 relation codes
    Relations,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match cli.command {
        Commands::Classify {
            a_start,
            a_end,
            b_start,
            b_end,
            unit,
        } => match TimeUnit::from_name(&unit) {
            Some(unit) => commands::cmd_classify(&a_start, &a_end, &b_start, &b_end, unit, json),
            None => {
                eprintln!("Error: unknown unit {:?}", unit);
                process::exit(2);
            }
        },
        Commands::Solve { file } => commands::cmd_solve(&file, json),
        Commands::Segment { file } => commands::cmd_segment(&file, json),
        Commands::Relations => commands::cmd_relations(json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            timeweave::TemporalError::Io(_) => 1,
            timeweave::TemporalError::InvalidPlan(_)
            | timeweave::TemporalError::InvalidTimestamp { .. }
            | timeweave::TemporalError::NaiveTimestamp(_)
            | timeweave::TemporalError::InvalidDuration(_) => 2,
            timeweave::TemporalError::Unsatisfiable
            | timeweave::TemporalError::SolverTimeout(_) => 3,
            timeweave::TemporalError::IntervalNotFound(_)
            | timeweave::TemporalError::BridgeNotFound(_) => 4,
            _ => 5,
        };
        process::exit(code);
    }
}
