//! Output formatting utilities for CLI.

use cholerama::engine::MatchResult;
use cholerama::scores::{ScoreRecord, Standing};
use serde::Serialize;

/// JSON-serializable match result.
#[derive(Debug, Serialize)]
pub(super) struct JsonMatchResult {
    /// Steps played.
    pub(super) steps: u32,
    /// Whether the match was stopped early.
    pub(super) exit_requested: bool,
    /// Winner player number (null on a tie).
    pub(super) winner: Option<u8>,
    /// Per-player results.
    pub(super) players: Vec<JsonPlayerResult>,
    /// Cumulative standings after this round.
    pub(super) standings: Vec<Standing>,
}

/// JSON-serializable player result.
#[derive(Debug, Serialize)]
pub(super) struct JsonPlayerResult {
    /// Player number.
    pub(super) number: u8,
    /// Player name.
    pub(super) name: String,
    /// Display colour.
    pub(super) color: String,
    /// Final live cells.
    pub(super) score: u32,
    /// Highest live cells.
    pub(super) peak: u32,
    /// Tokens left.
    pub(super) tokens: u32,
}

impl JsonMatchResult {
    /// Create from a match result and the updated score record.
    pub(super) fn new(result: &MatchResult, record: &ScoreRecord) -> Self {
        Self {
            steps: result.steps,
            exit_requested: result.exit_requested,
            winner: result.winner().map(|w| w.number),
            players: result
                .players
                .iter()
                .map(|p| JsonPlayerResult {
                    number: p.number,
                    name: p.name.clone(),
                    color: p.color.clone(),
                    score: p.score,
                    peak: p.peak,
                    tokens: p.tokens,
                })
                .collect(),
            standings: record.standings(),
        }
    }
}

/// JSON-serializable score record summary.
#[derive(Debug, Serialize)]
pub(super) struct JsonStandings {
    /// Rounds recorded.
    pub(super) rounds_played: u32,
    /// Ranked players.
    pub(super) standings: Vec<Standing>,
}

impl JsonStandings {
    /// Create from a score record.
    pub(super) fn new(record: &ScoreRecord) -> Self {
        Self {
            rounds_played: record.rounds_played,
            standings: record.standings(),
        }
    }
}

/// Format a match result as human-readable text.
pub(super) fn format_text(result: &MatchResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Match Result ({} steps", result.steps));
    if result.exit_requested {
        output.push_str(", stopped early");
    }
    output.push_str(")\n");
    if let Some(winner) = result.winner() {
        output.push_str(&format!("  Winner: Player {} ({})\n", winner.number, winner.name));
    } else {
        output.push_str("  Winner: Draw\n");
    }
    output.push('\n');

    for p in &result.players {
        output.push_str(&format!(
            "  Player {}: {} cells, peak {}, {} tokens ({})\n",
            p.number, p.score, p.peak, p.tokens, p.name
        ));
    }

    output
}

/// Format standings as a ranked list.
pub(super) fn format_standings(standings: &[Standing]) -> String {
    let mut output = String::from("\nScores:\n");
    if standings.is_empty() {
        output.push_str("  (no rounds recorded)\n");
    }
    for s in standings {
        output.push_str(&format!(
            "{}. {}: {} (this round: {}) [peak: {}]\n",
            s.rank, s.name, s.score, s.this_round, s.peak
        ));
    }
    output
}
