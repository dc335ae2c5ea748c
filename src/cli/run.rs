//! Run command implementation.

use super::output::{JsonMatchResult, format_standings, format_text};
use super::{CliError, OutputFormat};
use cholerama::bot::{Bot, GermBot, IdleBot};
use cholerama::config::MatchConfig;
use cholerama::engine::play_with;
use cholerama::game::Pattern;
use cholerama::scores::{DEFAULT_SCORES_FILE, ScoreLedger};
use cholerama::shared::SharedState;
use cholerama::snapshot::Snapshot;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

/// Roster used when no names are given.
const DEFAULT_ROSTER: [&str; 4] = ["Cholera", "Typhoid", "Dysentery", "Malaria"];

/// Options for the run command.
#[derive(clap::Args, Debug)]
pub(crate) struct RunOptions {
    /// Names of germ bots to enter (default: Cholera Typhoid Dysentery Malaria)
    names: Vec<String>,

    /// Also enter an idle bot that only plays a glider
    #[arg(long = "idle", value_name = "NAME")]
    idle: Vec<String>,

    /// TOML configuration file; command-line options override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Steps to simulate
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Seed for patch assignment and germ bots
    #[arg(short, long)]
    seed: Option<u64>,

    /// Kernel threads (0 = one per core, 1 = sequential)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Ignore bot failures instead of ending the match
    #[arg(long)]
    safe: bool,

    /// Record this round in the score file
    #[arg(long)]
    record: bool,

    /// Score file
    #[arg(long, default_value = DEFAULT_SCORES_FILE)]
    scores: PathBuf,

    /// Save a JSON snapshot of the result (default: results-<time>.json)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    snapshot: Option<Option<PathBuf>>,

    /// Publish the match to a shared region for `watch` and `control`
    #[arg(long, value_name = "PATH")]
    shared: Option<PathBuf>,

    /// Start paused; resume with `control <region> resume`
    #[arg(long, requires = "shared")]
    start_paused: bool,

    /// Maximum steps per second
    #[arg(long)]
    fps: Option<u32>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Show progress bar
    #[arg(short, long)]
    progress: bool,
}

impl RunOptions {
    /// Configuration file plus overrides.
    fn config(&self) -> Result<MatchConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::from_toml_file(path)?,
            None => MatchConfig::default(),
        };
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(fps) = self.fps {
            config.fps = Some(fps);
        }
        config.safe |= self.safe;
        if self.record {
            config.test = false;
        }
        Ok(config)
    }

    /// Germ bots followed by idle bots.
    fn roster(&self, seed: u64) -> Vec<Box<dyn Bot>> {
        let germs: Vec<String> = if self.names.is_empty() && self.idle.is_empty() {
            DEFAULT_ROSTER.iter().map(ToString::to_string).collect()
        } else {
            self.names.clone()
        };

        let mut bots: Vec<Box<dyn Bot>> = Vec::with_capacity(germs.len() + self.idle.len());
        for (i, name) in (0u64..).zip(germs) {
            bots.push(Box::new(GermBot::new(name, seed.wrapping_add(i + 1))));
        }
        for name in &self.idle {
            bots.push(Box::new(IdleBot::new(
                name.clone(),
                Pattern::from_rows(&[".#.", "..#", "###"]),
            )));
        }
        bots
    }
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the match cannot be set up, a bot fails outside safe
/// mode, or the results cannot be saved.
pub(crate) fn execute(options: RunOptions, quiet: bool) -> Result<(), CliError> {
    let config = options.config()?;
    let bots = options.roster(config.seed);
    let names: Vec<String> = bots.iter().map(|b| b.name().to_string()).collect();
    let ledger = ScoreLedger::new(&options.scores, config.test);

    let shared = match &options.shared {
        Some(path) => {
            let shared = SharedState::create(path, config.nx, config.ny, bots.len(), config.iterations)?;
            shared.flow().set_paused(options.start_paused);
            info!(path = %path.display(), paused = options.start_paused, "shared region ready");
            Some(shared)
        }
        None => None,
    };

    if !quiet && options.format == OutputFormat::Text {
        println!("Running {} steps with seed {}...", config.iterations, config.seed);
        println!("Players: {}", names.join(", "));
        println!();
    }

    let pb = if options.progress {
        let pb = ProgressBar::new(u64::from(config.iterations));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} steps ({per_sec})")?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcome = play_with(config, bots, &ledger, shared, |game| {
        if let Some(pb) = &pb {
            pb.set_position(u64::from(game.step()));
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let result = outcome.result;
    if let Some(path) = options.snapshot {
        let path = path.unwrap_or_else(Snapshot::default_path);
        Snapshot::from_result(&result).save(&path)?;
        if !quiet && options.format == OutputFormat::Text {
            println!("Snapshot saved to: {}", path.display());
            println!();
        }
    }
    let record = outcome.scores?;

    match options.format {
        OutputFormat::Text => {
            print!("{}", format_text(&result));
            print!("{}", format_standings(&record.standings()));
        }
        OutputFormat::Json => {
            let json = JsonMatchResult::new(&result, &record);
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
