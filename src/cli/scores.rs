//! Scores command implementation.

use super::output::{JsonStandings, format_standings};
use super::{CliError, OutputFormat};
use cholerama::scores::ScoreLedger;
use std::path::Path;

/// Execute the scores command.
///
/// # Errors
///
/// Returns an error if the score file exists but cannot be read.
pub(crate) fn execute(file: &Path, format: OutputFormat) -> Result<(), CliError> {
    let record = ScoreLedger::new(file, false).try_load()?.unwrap_or_default();

    match format {
        OutputFormat::Text => {
            println!("{} rounds in {}", record.rounds_played, file.display());
            print!("{}", format_standings(&record.standings()));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&JsonStandings::new(&record))?);
        }
    }
    Ok(())
}
