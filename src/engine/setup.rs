//! Roster validation and initial board.

use std::collections::HashSet;

use tracing::info;

use crate::bot::Bot;
use crate::config::MatchConfig;
use crate::error::ConfigError;
use crate::game::{Board, MAX_PLAYERS, Patch, Player, PlayerId, TokenLedger, palette_color};
use crate::rng::Rng;

/// Validate the configuration and roster, assign patches and draw every
/// starting pattern onto a fresh board.
///
/// Player numbers follow the roster order starting at 1.
pub(crate) fn build(config: &MatchConfig, bots: &[Box<dyn Bot>]) -> Result<(Board, Vec<Player>), ConfigError> {
    config.validate()?;

    let patches = config.patches();
    let max = patches.len().min(MAX_PLAYERS);
    if bots.is_empty() {
        return Err(ConfigError::NoPlayers);
    }
    if bots.len() > max {
        return Err(ConfigError::TooManyPlayers {
            players: bots.len(),
            max,
        });
    }

    let mut board = Board::new(config.nx, config.ny).ok_or(ConfigError::InvalidDimensions {
        nx: config.nx,
        ny: config.ny,
    })?;

    let mut slots: Vec<usize> = (0..patches.len()).collect();
    Rng::new(config.seed).shuffle(&mut slots);

    let mut names = HashSet::new();
    let mut players = Vec::with_capacity(bots.len());
    for (i, (bot, &slot)) in bots.iter().zip(&slots).enumerate() {
        let number = PlayerId::try_from(i + 1).map_err(|_| ConfigError::TooManyPlayers {
            players: bots.len(),
            max,
        })?;

        let name = bot.name().to_string();
        if name.is_empty() {
            return Err(ConfigError::EmptyName(number));
        }
        if !names.insert(name.clone()) {
            return Err(ConfigError::DuplicateName(name));
        }

        let pattern = bot.pattern();
        pattern
            .validate(config.pattern_size)
            .map_err(|source| ConfigError::Pattern {
                player: name.clone(),
                source,
            })?;
        let cells = u32::try_from(pattern.len()).unwrap_or(u32::MAX);
        let ledger = TokenLedger::with_pattern(config.initial_tokens, cells).map_err(|_| {
            ConfigError::PatternOverBudget {
                player: name.clone(),
                cells: pattern.len(),
                budget: config.initial_tokens,
            }
        })?;

        let patch = patches[slot];
        place_pattern(&mut board, &patch, config.pattern_size, pattern.cells(), number);
        info!(player = %name, number, x = patch.x, y = patch.y, cells, "player placed");

        let color = bot.color().unwrap_or_else(|| palette_color(i).to_string());
        players.push(Player::new(number, name, color, pattern, patch, ledger, config.iterations));
    }

    Ok((board, players))
}

/// Draw a pattern centred in its patch.
fn place_pattern(board: &mut Board, patch: &Patch, pattern_size: (usize, usize), cells: &[(usize, usize)], owner: PlayerId) {
    let nx = board.width();
    let ox = patch.x + patch.width.saturating_sub(pattern_size.0) / 2;
    let oy = patch.y + patch.height.saturating_sub(pattern_size.1) / 2;
    let board_cells = board.cells_mut();
    for &(dx, dy) in cells {
        board_cells[(oy + dy) * nx + ox + dx] = owner;
    }
}
