// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Cholerama: a deterministic multiplayer Game of Life arena.
//!
//! Bots compete for territory on a shared toroidal board. Every live cell
//! belongs to a player; newborn cells take the owner of the majority of their
//! parents. Bots may inject new cells by spending tokens, which they earn
//! while they still have cells alive.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Round Engine (engine)             │──▶ Score Ledger (scores)
//! ├──────────────────┬──────────────────┤──▶ Snapshot (snapshot)
//! │  Bot Gateway     │  Grid Kernel     │
//! │  (bot)           │  (game, rayon)   │
//! ├──────────────────┴──────────────────┤
//! │   Shared region (shared, memmap2)   │◀── viewer process
//! └─────────────────────────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod rng;
pub mod scores;
pub mod shared;
pub mod snapshot;

pub use bot::{Bot, BotContext, BotError, Gateway, GermBot, IdleBot, Placement, StepReport};
pub use config::MatchConfig;
pub use engine::{Match, MatchResult, MatchState, Outcome, PlayerResult, play, play_with};
pub use error::{ConfigError, MatchError, PlacementError};
pub use game::{Board, BoardView, Kernel, Patch, Pattern, Player, PlayerId};
pub use scores::{ScoreError, ScoreLedger, ScoreRecord};
pub use shared::{SharedError, SharedState};
pub use snapshot::{Snapshot, SnapshotError};
