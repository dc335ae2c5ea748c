//! Player state.

use crate::game::{Pattern, Patch, PlayerId, TokenLedger};

/// Display palette: the saturated half of matplotlib's `tab20` followed by
/// the light half.
const PALETTE: [&str; 20] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#aec7e8", "#ffbb78", "#98df8a", "#ff9896", "#c5b0d5", "#c49c94",
    "#f7b6d2", "#c7c7c7", "#dbdb8d", "#9edae5",
];

/// Default display colour for the player at `index` (0-based).
#[must_use]
pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// State for a single player.
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable 1-based id; also the value of this player's board cells.
    pub number: PlayerId,
    /// Unique display name.
    pub name: String,
    /// Display colour as `#rrggbb`.
    pub color: String,
    /// Starting pattern.
    pub pattern: Pattern,
    /// Home region.
    pub patch: Patch,
    /// Tokens, live cells and peak.
    pub ledger: TokenLedger,
    /// Live cells at every step, starting with the initial pattern.
    pub history: Vec<u32>,
}

impl Player {
    /// Create a player whose history starts with the pattern size.
    ///
    /// `iterations` only sizes the history buffer.
    #[must_use]
    pub fn new(
        number: PlayerId,
        name: String,
        color: String,
        pattern: Pattern,
        patch: Patch,
        ledger: TokenLedger,
        iterations: u32,
    ) -> Self {
        let mut history = Vec::with_capacity(iterations as usize + 1);
        history.push(ledger.ncells());
        Self {
            number,
            name,
            color,
            pattern,
            patch,
            ledger,
            history,
        }
    }

    /// Record the live-cell count for a completed step.
    pub fn record_step(&mut self, ncells: u32) {
        self.ledger.record_cells(ncells);
        self.history.push(ncells);
    }

    /// Live cells after the last step.
    #[must_use]
    pub const fn ncells(&self) -> u32 {
        self.ledger.ncells()
    }

    /// Whether the player still takes part (has live cells).
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.ledger.is_alive()
    }
}
