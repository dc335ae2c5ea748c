//! CLI command implementations for Cholerama.

pub(crate) mod control;
pub(crate) mod run;
pub(crate) mod scores;
pub(crate) mod watch;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

/// Output format for `run` and `scores`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Flag to raise in a running match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ControlAction {
    /// Stop stepping until resumed.
    Pause,
    /// Continue a paused match.
    Resume,
    /// End the match; scores are still recorded.
    Stop,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON encoding failed: {e}"))
    }
}

impl From<cholerama::ConfigError> for CliError {
    fn from(e: cholerama::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<cholerama::MatchError> for CliError {
    fn from(e: cholerama::MatchError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<cholerama::SharedError> for CliError {
    fn from(e: cholerama::SharedError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<cholerama::ScoreError> for CliError {
    fn from(e: cholerama::ScoreError) -> Self {
        Self::new(format!("Failed to save scores: {e}"))
    }
}

impl From<cholerama::SnapshotError> for CliError {
    fn from(e: cholerama::SnapshotError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<indicatif::style::TemplateError> for CliError {
    fn from(e: indicatif::style::TemplateError) -> Self {
        Self::new(format!("Invalid progress template: {e}"))
    }
}
