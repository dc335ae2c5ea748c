//! Game layer for Cholerama.
//!
//! - Toroidal board of cell owners
//! - Ownership-aware Life kernel
//! - Token economy
//! - Players and their starting patterns

mod board;
mod kernel;
mod ledger;
mod pattern;
mod player;

pub use board::{Board, BoardView, EMPTY, Patch, PlayerId, wrap};
pub use kernel::{Kernel, NEIGHBOR_OFFSETS, birth_owner, histogram, next_cell};
pub use ledger::{InsufficientTokens, TokenLedger};
pub use pattern::{Pattern, PatternError};
pub use player::{Player, palette_color};

/// Largest number of players a board can hold (one owner id per player).
pub const MAX_PLAYERS: usize = PlayerId::MAX as usize;
