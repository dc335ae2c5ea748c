//! Bot invocation and placement validation.
//!
//! A step runs in two phases:
//!
//! 1. Every live player's bot is consulted in call order while the board is
//!    borrowed immutably, so no bot can observe another bot's placements or
//!    modify the board.
//! 2. The collected placements are validated and applied sequentially in the
//!    same order. An invalid request is dropped as a whole and logged.
//!
//! Bot faults (an `Err` from [`Bot::decide`] or a panic) are swallowed in safe
//! mode and end the match otherwise.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::bot::{Bot, BotContext, BotError, Placement};
use crate::config::MatchConfig;
use crate::error::{MatchError, PlacementError};
use crate::game::{Board, EMPTY, InsufficientTokens, Patch, Player, wrap};

/// What happened during one step of bot calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Bots consulted.
    pub consulted: u32,
    /// Cells injected across all players.
    pub cells_placed: u32,
    /// Placement requests rejected.
    pub rejected: u32,
    /// Bot faults swallowed in safe mode.
    pub faults: u32,
}

/// Calls bots and applies their placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gateway {
    /// Swallow bot faults.
    safe: bool,
    /// Coordinates are relative to the player's patch.
    confine_to_patch: bool,
}

impl Gateway {
    /// Create a gateway.
    #[must_use]
    pub const fn new(safe: bool, confine_to_patch: bool) -> Self {
        Self {
            safe,
            confine_to_patch,
        }
    }

    /// Create a gateway with the policies from `config`.
    #[must_use]
    pub const fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.safe, config.confine_to_patch)
    }

    /// Call a bot, turning a panic into [`BotError::Panicked`].
    ///
    /// # Errors
    ///
    /// Returns the bot's error or the panic message.
    pub fn invoke(&self, bot: &mut dyn Bot, ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        match panic::catch_unwind(AssertUnwindSafe(|| bot.decide(ctx))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(BotError::Panicked(message))
            }
        }
    }

    /// Wrap requested coordinates onto the board and drop duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::LengthMismatch`] if the lists differ in length.
    pub fn resolve(
        &self,
        placement: &Placement,
        patch: &Patch,
        nx: usize,
        ny: usize,
    ) -> Result<Vec<(usize, usize)>, PlacementError> {
        if placement.x.len() != placement.y.len() {
            return Err(PlacementError::LengthMismatch {
                x: placement.x.len(),
                y: placement.y.len(),
            });
        }

        let mut cells: Vec<(usize, usize)> = placement
            .x
            .iter()
            .zip(&placement.y)
            .map(|(&x, &y)| {
                if self.confine_to_patch {
                    patch.to_board(x, y, nx, ny)
                } else {
                    (wrap(x, nx), wrap(y, ny))
                }
            })
            .collect();
        cells.sort_unstable_by_key(|&(x, y)| (y, x));
        cells.dedup();
        Ok(cells)
    }

    /// Validate a placement against the board and the player's balance, then
    /// apply it. Returns the number of cells injected.
    ///
    /// Every requested coordinate must be covered by the balance, but only
    /// distinct cells are charged.
    ///
    /// # Errors
    ///
    /// Leaves the board and balance untouched and returns why the request was
    /// refused.
    pub fn apply(&self, board: &mut Board, player: &mut Player, placement: &Placement) -> Result<u32, PlacementError> {
        let nx = board.width();
        let targets = self.resolve(placement, &player.patch, nx, board.height())?;
        if targets.is_empty() {
            return Ok(0);
        }

        // The request as sent counts against the balance, duplicates included
        let balance = player.ledger.balance();
        let requested = u32::try_from(placement.len()).unwrap_or(u32::MAX);
        if requested > balance {
            return Err(InsufficientTokens { requested, balance }.into());
        }

        let cells = board.cells();
        if let Some(&(x, y)) = targets.iter().find(|&&(x, y)| cells[y * nx + x] != EMPTY) {
            return Err(PlacementError::Occupied {
                x,
                y,
                owner: cells[y * nx + x],
            });
        }

        let cost = u32::try_from(targets.len()).unwrap_or(u32::MAX);
        player.ledger.charge(cost)?;
        let cells = board.cells_mut();
        for (x, y) in targets {
            cells[y * nx + x] = player.number;
        }
        Ok(cost)
    }

    /// Consult every live player's bot in `order` and apply their placements.
    ///
    /// `bots[i]` plays for `players[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::BotFault`] if a bot fails while safe mode is off.
    pub fn run_step(
        &self,
        iteration: u32,
        board: &mut Board,
        players: &mut [Player],
        bots: &mut [Box<dyn Bot>],
        order: &[usize],
    ) -> Result<StepReport, MatchError> {
        let mut report = StepReport::default();
        let mut proposals: Vec<(usize, Placement)> = Vec::new();

        // Phase 1: consult bots against a frozen board
        {
            let frozen: &Board = board;
            for &idx in order {
                let player = &players[idx];
                if !player.is_alive() {
                    continue;
                }

                let ctx = BotContext {
                    iteration,
                    board: frozen.view(),
                    patch: frozen.patch_view(&player.patch),
                    tokens: player.ledger.balance(),
                    number: player.number,
                };
                report.consulted += 1;

                match self.invoke(bots[idx].as_mut(), &ctx) {
                    Ok(Some(placement)) if !placement.is_empty() => proposals.push((idx, placement)),
                    Ok(_) => {}
                    Err(source) if self.safe => {
                        warn!(player = %player.name, iteration, error = %source, "bot fault ignored");
                        report.faults += 1;
                    }
                    Err(source) => {
                        return Err(MatchError::BotFault {
                            player: player.name.clone(),
                            source,
                        });
                    }
                }
            }
        }

        // Phase 2: sequential application in call order
        for (idx, placement) in proposals {
            let player = &mut players[idx];
            match self.apply(board, player, &placement) {
                Ok(placed) => {
                    debug!(player = %player.name, iteration, placed, "cells placed");
                    report.cells_placed += placed;
                }
                Err(error) => {
                    warn!(player = %player.name, iteration, %error, "placement rejected");
                    report.rejected += 1;
                }
            }
        }

        Ok(report)
    }
}
