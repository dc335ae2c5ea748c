//! Match configuration.
//!
//! One immutable [`MatchConfig`] value is built before a match (defaults,
//! optionally a TOML file, then command-line overrides) and handed to every
//! component that needs it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::Patch;

/// Configuration for a match. Fixed for the duration of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Board columns.
    pub nx: usize,
    /// Board rows.
    pub ny: usize,
    /// Patch grid as `(rows, cols)`.
    pub npatches: (usize, usize),
    /// Steps to simulate.
    pub iterations: u32,
    /// Tokens each player starts with, before paying for its pattern.
    pub initial_tokens: u32,
    /// Tokens each surviving player earns over the whole match.
    pub additional_tokens: u32,
    /// Box `(width, height)` every starting pattern must fit in.
    pub pattern_size: (usize, usize),
    /// Kernel worker threads (0 = one per core, 1 = sequential).
    pub threads: usize,
    /// Treat bot failures as "no action" instead of ending the match.
    pub safe: bool,
    /// Test mode: scores are neither read nor written.
    pub test: bool,
    /// Seed for patch assignment.
    pub seed: u64,
    /// Upper bound on steps per second, for a live viewer.
    pub fps: Option<u32>,
    /// Interpret bot coordinates relative to the bot's patch.
    pub confine_to_patch: bool,
    /// Delay between control-flag polls while paused, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            nx: 384,
            ny: 256,
            npatches: (4, 6),
            iterations: 4000,
            initial_tokens: 100,
            additional_tokens: 400,
            pattern_size: (12, 12),
            threads: 0,
            safe: false,
            test: true,
            seed: 0,
            fps: None,
            confine_to_patch: false,
            poll_interval_ms: 50,
        }
    }
}

impl MatchConfig {
    /// Load a configuration from a TOML file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Steps between token grants, `max(1, iterations / additional_tokens)`.
    ///
    /// `None` when no tokens accrue during the match.
    #[must_use]
    pub fn token_interval(&self) -> Option<u32> {
        if self.additional_tokens == 0 {
            return None;
        }
        Some((self.iterations / self.additional_tokens).max(1))
    }

    /// The patch grid for this board.
    #[must_use]
    pub fn patches(&self) -> Vec<Patch> {
        Patch::grid(self.nx, self.ny, self.npatches.0, self.npatches.1)
    }

    /// Minimum time per step when `fps` is set.
    #[must_use]
    pub fn frame_time(&self) -> Option<Duration> {
        self.fps
            .filter(|&fps| fps > 0)
            .map(|fps| Duration::from_secs(1) / fps)
    }

    /// Delay between flag polls while paused.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check dimensions, patch grid and pattern box.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx == 0 || self.ny == 0 {
            return Err(ConfigError::InvalidDimensions {
                nx: self.nx,
                ny: self.ny,
            });
        }
        let (rows, cols) = self.npatches;
        if rows == 0 || cols == 0 || rows > self.ny || cols > self.nx {
            return Err(ConfigError::InvalidPatches {
                rows,
                cols,
                nx: self.nx,
                ny: self.ny,
            });
        }
        let patch = (self.nx / cols, self.ny / rows);
        let (pw, ph) = self.pattern_size;
        if pw == 0 || ph == 0 || pw > patch.0 || ph > patch.1 {
            return Err(ConfigError::PatternBox {
                pattern: self.pattern_size,
                patch,
            });
        }
        Ok(())
    }
}
