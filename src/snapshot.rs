//! JSON archive of a finished match, for plotting tools.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::MatchResult;
use crate::game::{Pattern, PlayerId};

/// Errors saving or loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The file could not be read or written.
    #[error("snapshot I/O on {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid snapshot.
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
    /// The board does not match the recorded dimensions.
    #[error("board has {cells} cells, expected {nx}x{ny}")]
    BoardSize {
        /// Recorded columns.
        nx: usize,
        /// Recorded rows.
        ny: usize,
        /// Cells present.
        cells: usize,
    },
}

/// One player in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPlayer {
    /// Player name.
    pub name: String,
    /// Player id on the board.
    pub number: PlayerId,
    /// Display colour.
    pub color: String,
    /// Starting pattern.
    #[serde(default)]
    pub pattern: Pattern,
    /// Live cells per step.
    pub history: Vec<u32>,
}

/// Final board and per-player histories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Board columns.
    pub nx: usize,
    /// Board rows.
    pub ny: usize,
    /// Final board, row-major.
    pub board: Vec<PlayerId>,
    /// Players in roster order.
    pub players: Vec<SnapshotPlayer>,
}

impl Snapshot {
    /// Capture a match result.
    #[must_use]
    pub fn from_result(result: &MatchResult) -> Self {
        Self {
            nx: result.board.width(),
            ny: result.board.height(),
            board: result.board.cells().to_vec(),
            players: result
                .players
                .iter()
                .map(|p| SnapshotPlayer {
                    name: p.name.clone(),
                    number: p.number,
                    color: p.color.clone(),
                    pattern: p.pattern.clone(),
                    history: p.history.clone(),
                })
                .collect(),
        }
    }

    /// `results-<unix seconds>.json` in the current directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        PathBuf::from(format!("results-{secs}.json"))
    }

    /// Write the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a snapshot back.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Self = serde_json::from_str(&text)?;
        if snapshot.board.len() != snapshot.nx * snapshot.ny {
            return Err(SnapshotError::BoardSize {
                nx: snapshot.nx,
                ny: snapshot.ny,
                cells: snapshot.board.len(),
            });
        }
        Ok(snapshot)
    }
}
