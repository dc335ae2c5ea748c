//! Error types for match setup and play.

use std::path::PathBuf;

use crate::bot::BotError;
use crate::game::{InsufficientTokens, PatternError, PlayerId};
use crate::shared::SharedError;

/// Invalid configuration or roster, detected before the match starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Board dimensions are zero.
    #[error("invalid board dimensions {nx}x{ny}")]
    InvalidDimensions {
        /// Columns.
        nx: usize,
        /// Rows.
        ny: usize,
    },
    /// The patch grid does not fit the board.
    #[error("cannot split a {nx}x{ny} board into {rows}x{cols} patches")]
    InvalidPatches {
        /// Patch rows.
        rows: usize,
        /// Patch columns.
        cols: usize,
        /// Board columns.
        nx: usize,
        /// Board rows.
        ny: usize,
    },
    /// The pattern box is empty or larger than a patch.
    #[error("pattern box {pattern:?} does not fit in a {patch:?} patch")]
    PatternBox {
        /// Pattern box `(width, height)`.
        pattern: (usize, usize),
        /// Patch `(width, height)`.
        patch: (usize, usize),
    },
    /// No bots were supplied.
    #[error("a match needs at least one player")]
    NoPlayers,
    /// More players than patches or owner ids.
    #[error("too many players: {players} (at most {max})")]
    TooManyPlayers {
        /// Players supplied.
        players: usize,
        /// Players the configuration can hold.
        max: usize,
    },
    /// A bot name is empty.
    #[error("player {0} has an empty name")]
    EmptyName(PlayerId),
    /// Two bots share a name.
    #[error("duplicate player name {0:?}")]
    DuplicateName(String),
    /// A starting pattern is malformed or too large.
    #[error("invalid pattern for {player}: {source}")]
    Pattern {
        /// Player name.
        player: String,
        /// What is wrong with the pattern.
        #[source]
        source: PatternError,
    },
    /// A starting pattern costs more than the initial token budget.
    #[error("pattern for {player} has {cells} cells but only {budget} initial tokens")]
    PatternOverBudget {
        /// Player name.
        player: String,
        /// Cells in the pattern.
        cells: usize,
        /// Initial tokens.
        budget: u32,
    },
    /// The kernel worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    /// A configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A configuration file is not valid TOML for [`crate::MatchConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A rejected cell-placement request. The request is dropped as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The x and y coordinate lists differ in length.
    #[error("x and y have different lengths ({x} vs {y})")]
    LengthMismatch {
        /// Length of the x list.
        x: usize,
        /// Length of the y list.
        y: usize,
    },
    /// The request costs more tokens than the player holds.
    #[error(transparent)]
    InsufficientTokens(#[from] InsufficientTokens),
    /// A targeted cell is already alive.
    #[error("cell ({x}, {y}) is already occupied by player {owner}")]
    Occupied {
        /// Board column.
        x: usize,
        /// Board row.
        y: usize,
        /// Current owner.
        owner: PlayerId,
    },
}

/// Errors that end a match.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Setup failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A bot failed while safe mode was off.
    #[error("bot {player} failed: {source}")]
    BotFault {
        /// Player name.
        player: String,
        /// What the bot did.
        #[source]
        source: BotError,
    },
    /// The shared region could not be used.
    #[error(transparent)]
    Shared(#[from] SharedError),
}
