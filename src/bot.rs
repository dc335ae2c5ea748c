//! Bot interface.
//!
//! Bots are untrusted collaborators. Each one supplies a starting pattern
//! once, then is asked once per step whether it wants to inject cells. Bots
//! only ever see the board through a [`BoardView`], so they cannot modify it.

mod builtin;
mod gateway;

pub use builtin::{GermBot, IdleBot};
pub use gateway::{Gateway, StepReport};

use crate::error::PlacementError;
use crate::game::{BoardView, Pattern, PlayerId};

/// Everything a bot is shown when asked for a decision.
#[derive(Debug, Clone, Copy)]
pub struct BotContext<'a> {
    /// Step index, starting at 0.
    pub iteration: u32,
    /// The latest board.
    pub board: BoardView<'a>,
    /// The bot's home patch.
    pub patch: BoardView<'a>,
    /// Tokens the bot can spend this step.
    pub tokens: u32,
    /// The bot's player id (the value of its cells).
    pub number: PlayerId,
}

/// Cells a bot asks to bring to life, as parallel coordinate lists.
///
/// Coordinates may be negative or exceed the board; they wrap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// Columns.
    pub x: Vec<i64>,
    /// Rows.
    pub y: Vec<i64>,
}

impl Placement {
    /// Build a placement, checking the lists have the same length.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::LengthMismatch`] otherwise.
    pub fn new(x: Vec<i64>, y: Vec<i64>) -> Result<Self, PlacementError> {
        if x.len() != y.len() {
            return Err(PlacementError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    /// Build a placement from coordinate pairs.
    #[must_use]
    pub fn from_cells(cells: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let (x, y) = cells.into_iter().unzip();
        Self { x, y }
    }

    /// Number of requested cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len().max(self.y.len())
    }

    /// Whether nothing is requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }
}

/// A bot failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BotError {
    /// The bot reported an error.
    #[error("{0}")]
    Failed(String),
    /// The bot panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// A competing bot.
pub trait Bot {
    /// Unique display name.
    fn name(&self) -> &str;

    /// Starting pattern, read once at setup.
    fn pattern(&self) -> Pattern;

    /// Preferred display colour as `#rrggbb`; the palette is used otherwise.
    fn color(&self) -> Option<String> {
        None
    }

    /// Decide which cells to inject this step, if any.
    ///
    /// # Errors
    ///
    /// A returned error is a bot fault: ignored in safe mode, fatal otherwise.
    fn decide(&mut self, ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError>;
}
