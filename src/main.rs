//! Cholerama CLI - run matches, watch them live and manage scores.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Cholerama - a multiplayer Game of Life arena
#[derive(Parser, Debug)]
#[command(name = "cholerama")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Only log warnings and errors (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a match between built-in bots
    Run(cli::run::RunOptions),

    /// Follow a running match through its shared region
    Watch {
        /// Shared region file written by `run --shared`
        #[arg(required = true)]
        region: PathBuf,

        /// Refresh interval in milliseconds (default: 100)
        #[arg(long, default_value = "100")]
        interval: u64,
    },

    /// Pause, resume or stop a running match
    Control {
        /// Shared region file written by `run --shared`
        #[arg(required = true)]
        region: PathBuf,

        /// What to do
        #[arg(value_enum)]
        action: cli::ControlAction,
    },

    /// Print standings from a score file
    Scores {
        /// Score file (default: scores.json)
        #[arg(long, default_value = cholerama::scores::DEFAULT_SCORES_FILE)]
        file: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.quiet);

    let result = match args.command {
        Commands::Run(options) => cli::run::execute(options, args.quiet),
        Commands::Watch { region, interval } => cli::watch::execute(&region, interval),
        Commands::Control { region, action } => cli::control::execute(&region, action),
        Commands::Scores { file, format } => cli::scores::execute(&file, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
