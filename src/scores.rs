//! Cumulative scores across rounds.
//!
//! The record is a JSON file (default `scores.json`). Each finalized round
//! adds every player's final live cells to their total and raises their peak.
//! In test mode the file is neither read nor written.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Default score file name.
pub const DEFAULT_SCORES_FILE: &str = "scores.json";

/// Errors reading or writing the score record.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// The file could not be read or written.
    #[error("score file I/O: {0}")]
    Io(#[from] io::Error),
    /// The file is not a valid record.
    #[error("invalid score file: {0}")]
    Json(#[from] serde_json::Error),
}

/// One player's result in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEntry {
    /// Player name.
    pub name: String,
    /// Live cells at the end of the round.
    pub score: u32,
    /// Highest live cells during the round.
    pub peak: u32,
}

/// One player's totals across rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTotals {
    /// Player name.
    pub name: String,
    /// Sum of round scores.
    pub score: u64,
    /// Highest round peak.
    pub peak: u32,
}

impl PlayerTotals {
    fn zero(name: &str) -> Self {
        Self {
            name: name.to_string(),
            score: 0,
            peak: 0,
        }
    }
}

/// A player's place in the standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// 1-based rank.
    pub rank: usize,
    /// Player name.
    pub name: String,
    /// Cumulative score.
    pub score: u64,
    /// Score in the latest round.
    pub this_round: u32,
    /// Cumulative peak.
    pub peak: u32,
}

/// The persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRecord {
    /// Rounds finalized so far.
    pub rounds_played: u32,
    /// Totals in order of first appearance.
    pub players: Vec<PlayerTotals>,
    /// Per-round breakdown, oldest first.
    pub rounds: Vec<Vec<RoundEntry>>,
}

impl ScoreRecord {
    /// Totals for one player.
    #[must_use]
    pub fn totals(&self, name: &str) -> Option<&PlayerTotals> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Totals for `names`, zero for anyone not in the record.
    #[must_use]
    pub fn read(&self, names: &[&str]) -> Vec<PlayerTotals> {
        names
            .iter()
            .map(|name| self.totals(name).cloned().unwrap_or_else(|| PlayerTotals::zero(name)))
            .collect()
    }

    /// Fold one round into the totals.
    pub fn merge_round(&mut self, round: &[RoundEntry]) {
        for entry in round {
            let idx = match self.players.iter().position(|p| p.name == entry.name) {
                Some(idx) => idx,
                None => {
                    self.players.push(PlayerTotals::zero(&entry.name));
                    self.players.len() - 1
                }
            };
            let totals = &mut self.players[idx];
            totals.score += u64::from(entry.score);
            totals.peak = totals.peak.max(entry.peak);
        }
        self.rounds.push(round.to_vec());
        self.rounds_played += 1;
    }

    /// Players ranked by cumulative score, ties in first-appearance order.
    #[must_use]
    pub fn standings(&self) -> Vec<Standing> {
        let last = self.rounds.last();
        let mut ranked: Vec<&PlayerTotals> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
            .into_iter()
            .enumerate()
            .map(|(i, totals)| Standing {
                rank: i + 1,
                name: totals.name.clone(),
                score: totals.score,
                this_round: last
                    .and_then(|round| round.iter().find(|e| e.name == totals.name))
                    .map_or(0, |e| e.score),
                peak: totals.peak,
            })
            .collect()
    }
}

/// Reads and updates the score file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLedger {
    path: PathBuf,
    /// Test mode: never touch the file.
    test: bool,
}

impl ScoreLedger {
    /// Ledger backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, test: bool) -> Self {
        Self {
            path: path.into(),
            test,
        }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record from disk, `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn try_load(&self) -> Result<Option<ScoreRecord>, ScoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// The current record; empty in test mode, when the file is missing, or
    /// when it cannot be read.
    #[must_use]
    pub fn load(&self) -> ScoreRecord {
        if self.test {
            return ScoreRecord::default();
        }
        match self.try_load() {
            Ok(record) => record.unwrap_or_default(),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "ignoring unreadable score file");
                ScoreRecord::default()
            }
        }
    }

    /// Totals for `names`, zero when unknown.
    #[must_use]
    pub fn read(&self, names: &[&str]) -> Vec<PlayerTotals> {
        self.load().read(names)
    }

    /// Rounds finalized so far.
    #[must_use]
    pub fn rounds_played(&self) -> u32 {
        self.load().rounds_played
    }

    /// Add a round to the record and write it back, unless in test mode.
    ///
    /// Returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn finalize(&self, round: &[RoundEntry]) -> Result<ScoreRecord, ScoreError> {
        let mut record = self.load();
        record.merge_round(round);
        if self.test {
            debug!("test mode, scores not written");
        } else {
            self.write(&record)?;
            info!(path = %self.path.display(), rounds = record.rounds_played, "scores saved");
        }
        Ok(record)
    }

    /// Replace the file atomically: write a temporary file next to it, then
    /// rename over it.
    fn write(&self, record: &ScoreRecord) -> Result<(), ScoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, record)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ScoreError::Io(e.error))?;
        Ok(())
    }
}
