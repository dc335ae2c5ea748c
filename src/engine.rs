//! Round engine: owns the boards and players and drives a match step by step.
//!
//! Each step while running:
//!
//! 1. Grant a token to every live player on accrual steps
//! 2. Consult bots in call order and apply their placements ([`Gateway`])
//! 3. Evolve the board ([`Kernel`]) and swap buffers
//! 4. Record live cells, history and peaks
//! 5. Publish boards, histories and balances to the shared region, if any
//!
//! Pause and exit flags are polled from the shared region once per step.

mod setup;

use std::fmt;
use std::mem;
use std::thread;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bot::{Bot, Gateway, StepReport};
use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::game::{Board, Kernel, Pattern, Player, PlayerId};
use crate::scores::{RoundEntry, ScoreError, ScoreLedger, ScoreRecord};
use crate::shared::SharedState;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchState {
    /// Steps are being played.
    Running,
    /// Waiting for the pause flag to clear.
    Paused,
    /// All steps played or exit requested.
    Finished,
}

/// Final state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerResult {
    /// Player id.
    pub number: PlayerId,
    /// Player name.
    pub name: String,
    /// Display colour.
    pub color: String,
    /// Starting pattern.
    pub pattern: Pattern,
    /// Live cells at the end (the round score).
    pub score: u32,
    /// Highest live cells during the match.
    pub peak: u32,
    /// Tokens left.
    pub tokens: u32,
    /// Live cells per step, starting with the pattern size.
    pub history: Vec<u32>,
}

/// Everything a finished match produced.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Players in roster order.
    pub players: Vec<PlayerResult>,
    /// Final board.
    pub board: Board,
    /// Steps played.
    pub steps: u32,
    /// Whether the match was stopped through the exit flag.
    pub exit_requested: bool,
    /// Rounds finalized before this match (the call-order rotation).
    pub rounds_played: u32,
}

impl MatchResult {
    /// This match as a score-ledger round.
    #[must_use]
    pub fn round_entries(&self) -> Vec<RoundEntry> {
        self.players
            .iter()
            .map(|p| RoundEntry {
                name: p.name.clone(),
                score: p.score,
                peak: p.peak,
            })
            .collect()
    }

    /// Player with the most live cells, `None` on a tie or if nobody survived.
    #[must_use]
    pub fn winner(&self) -> Option<&PlayerResult> {
        let best = self.players.iter().map(|p| p.score).max().filter(|&s| s > 0)?;
        let mut leaders = self.players.iter().filter(|p| p.score == best);
        let winner = leaders.next()?;
        leaders.next().is_none().then_some(winner)
    }
}

/// A match result plus the outcome of recording it.
#[derive(Debug)]
pub struct Outcome {
    /// The match result.
    pub result: MatchResult,
    /// Updated score record, or why it could not be saved.
    pub scores: Result<ScoreRecord, ScoreError>,
}

/// A match in progress.
pub struct Match {
    config: MatchConfig,
    /// Latest board.
    board: Board,
    /// Buffer the kernel writes into; holds the previous board after a step.
    scratch: Board,
    players: Vec<Player>,
    /// `bots[i]` plays for `players[i]`.
    bots: Vec<Box<dyn Bot>>,
    /// Indices into `players` in call order.
    order: Vec<usize>,
    kernel: Kernel,
    gateway: Gateway,
    /// Live cells per owner id after the last evolution.
    counts: Vec<u32>,
    last_report: StepReport,
    step: u32,
    state: MatchState,
    exit_requested: bool,
    token_interval: Option<u32>,
    rounds_played: u32,
    shared: Option<SharedState>,
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("step", &self.step)
            .field("state", &self.state)
            .field("players", &self.players.len())
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl Match {
    /// Set up a match.
    ///
    /// `rounds_played` rotates the call order so that a different player
    /// goes first each round.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or roster is invalid.
    pub fn new(config: MatchConfig, bots: Vec<Box<dyn Bot>>, rounds_played: u32) -> Result<Self, MatchError> {
        let (board, players) = setup::build(&config, &bots)?;
        let kernel = Kernel::new(config.threads)?;
        let scratch = board.clone();

        let mut order: Vec<usize> = (0..players.len()).collect();
        order.rotate_left(rounds_played as usize % players.len());

        info!(
            players = players.len(),
            nx = config.nx,
            ny = config.ny,
            iterations = config.iterations,
            threads = kernel.threads(),
            safe = config.safe,
            "match ready"
        );

        Ok(Self {
            gateway: Gateway::from_config(&config),
            token_interval: config.token_interval(),
            counts: vec![0; players.len() + 1],
            last_report: StepReport::default(),
            board,
            scratch,
            players,
            bots,
            order,
            kernel,
            step: 0,
            state: MatchState::Running,
            exit_requested: false,
            rounds_played,
            shared: None,
            config,
        })
    }

    /// Publish this match to a shared region and obey its control flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the region does not fit this match.
    pub fn with_shared(mut self, shared: SharedState) -> Result<Self, MatchError> {
        shared.publish_boards(&self.board, &self.board)?;
        shared.publish_step(self.step, &self.players)?;
        if shared.flow().is_paused() {
            self.state = MatchState::Paused;
        }
        self.shared = Some(shared);
        Ok(self)
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Latest board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Players in roster order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player indices in call order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Steps played so far.
    #[must_use]
    pub const fn step(&self) -> u32 {
        self.step
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> MatchState {
        self.state
    }

    /// Shared region, if attached.
    #[must_use]
    pub const fn shared(&self) -> Option<&SharedState> {
        self.shared.as_ref()
    }

    /// Bot calls and placements of the last completed step.
    #[must_use]
    pub const fn last_report(&self) -> StepReport {
        self.last_report
    }

    /// Advance by at most one step.
    ///
    /// Returns the state after the call. A paused match returns
    /// [`MatchState::Paused`] without doing anything.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::BotFault`] when a bot fails outside safe mode, or
    /// a shared-region error if publishing fails.
    pub fn step_once(&mut self) -> Result<MatchState, MatchError> {
        if self.state == MatchState::Finished {
            return Ok(MatchState::Finished);
        }

        if let Some(shared) = &self.shared {
            let flow = shared.flow();
            if flow.exit_requested() {
                info!(step = self.step, "exit requested");
                self.exit_requested = true;
                return Ok(self.finish());
            }
            let paused = flow.is_paused();
            if paused != (self.state == MatchState::Paused) {
                debug!(step = self.step, paused, "flow changed");
            }
            self.state = if paused { MatchState::Paused } else { MatchState::Running };
            if paused {
                return Ok(MatchState::Paused);
            }
        }

        if self.step >= self.config.iterations {
            return Ok(self.finish());
        }

        if self.token_interval.is_some_and(|interval| self.step % interval == 0) {
            for player in self.players.iter_mut().filter(|p| p.is_alive()) {
                player.ledger.grant();
            }
        }

        let report = self.gateway.run_step(
            self.step,
            &mut self.board,
            &mut self.players,
            &mut self.bots,
            &self.order,
        )?;

        self.kernel.evolve(&self.board, &mut self.scratch, &mut self.counts);
        mem::swap(&mut self.board, &mut self.scratch);
        for player in &mut self.players {
            let ncells = self.counts.get(usize::from(player.number)).copied().unwrap_or(0);
            player.record_step(ncells);
        }
        self.step += 1;

        if let Some(shared) = &self.shared {
            shared.publish_boards(&self.scratch, &self.board)?;
            shared.publish_step(self.step, &self.players)?;
        }
        debug!(step = self.step, ?report, "step done");
        self.last_report = report;

        if self.step >= self.config.iterations {
            return Ok(self.finish());
        }
        Ok(MatchState::Running)
    }

    fn finish(&mut self) -> MatchState {
        self.state = MatchState::Finished;
        self.raise_exit_flags();
        info!(steps = self.step, exit_requested = self.exit_requested, "match finished");
        MatchState::Finished
    }

    fn raise_exit_flags(&self) {
        if let Some(shared) = &self.shared {
            shared.flow().request_exit();
            shared.flow().set_finished();
            if let Err(error) = shared.flush() {
                warn!(%error, "shared region flush failed");
            }
        }
    }

    /// Play to the end.
    ///
    /// # Errors
    ///
    /// See [`Match::step_once`].
    pub fn run(self) -> Result<MatchResult, MatchError> {
        self.run_with(|_| {})
    }

    /// Play to the end, calling `on_step` after every completed step.
    ///
    /// Sleeps between flag polls while paused, and between steps when `fps`
    /// is set.
    ///
    /// # Errors
    ///
    /// See [`Match::step_once`]. The shared region is marked finished either way.
    pub fn run_with(mut self, mut on_step: impl FnMut(&Self)) -> Result<MatchResult, MatchError> {
        let frame = self.config.frame_time();
        loop {
            let started = Instant::now();
            match self.step_once() {
                Ok(MatchState::Finished) => break,
                Ok(MatchState::Paused) => thread::sleep(self.config.poll_interval()),
                Ok(MatchState::Running) => {
                    on_step(&self);
                    if let Some(remaining) = frame.and_then(|f| f.checked_sub(started.elapsed())) {
                        thread::sleep(remaining);
                    }
                }
                Err(error) => {
                    warn!(step = self.step, %error, "match aborted");
                    self.raise_exit_flags();
                    return Err(error);
                }
            }
        }
        on_step(&self);
        Ok(self.into_result())
    }

    /// Final result. Meaningful once the match is finished.
    #[must_use]
    pub fn into_result(self) -> MatchResult {
        let players = self
            .players
            .into_iter()
            .map(|p| PlayerResult {
                number: p.number,
                score: p.ncells(),
                peak: p.ledger.peak(),
                tokens: p.ledger.balance(),
                name: p.name,
                color: p.color,
                pattern: p.pattern,
                history: p.history,
            })
            .collect();
        MatchResult {
            players,
            board: self.board,
            steps: self.step,
            exit_requested: self.exit_requested,
            rounds_played: self.rounds_played,
        }
    }
}

/// Play one round: rotate the call order by the rounds already recorded,
/// run the match and fold its scores into `ledger`.
///
/// # Errors
///
/// Returns an error if the match cannot be set up or ends in a fault. Failing
/// to save scores is reported in [`Outcome::scores`] instead.
pub fn play(
    config: MatchConfig,
    bots: Vec<Box<dyn Bot>>,
    ledger: &ScoreLedger,
    shared: Option<SharedState>,
) -> Result<Outcome, MatchError> {
    play_with(config, bots, ledger, shared, |_| {})
}

/// [`play`], calling `on_step` after every completed step.
///
/// # Errors
///
/// See [`play`].
pub fn play_with(
    config: MatchConfig,
    bots: Vec<Box<dyn Bot>>,
    ledger: &ScoreLedger,
    shared: Option<SharedState>,
    on_step: impl FnMut(&Match),
) -> Result<Outcome, MatchError> {
    let rounds_played = ledger.rounds_played();
    let mut game = Match::new(config, bots, rounds_played)?;
    if let Some(shared) = shared {
        game = game.with_shared(shared)?;
    }
    let result = game.run_with(on_step)?;
    let scores = ledger.finalize(&result.round_entries());
    if let Err(error) = &scores {
        warn!(path = %ledger.path().display(), %error, "failed to save scores");
    }
    Ok(Outcome { result, scores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::IdleBot;
    use crate::game::Pattern;

    fn config() -> MatchConfig {
        MatchConfig {
            nx: 24,
            ny: 24,
            npatches: (2, 2),
            pattern_size: (4, 4),
            iterations: 6,
            initial_tokens: 10,
            additional_tokens: 3,
            threads: 1,
            ..MatchConfig::default()
        }
    }

    fn block(name: &str) -> Box<dyn Bot> {
        Box::new(IdleBot::new(name, Pattern::from_rows(&["##", "##"])))
    }

    #[test]
    fn test_order_rotates_with_rounds() {
        let game = Match::new(config(), vec![block("a"), block("b"), block("c")], 4).unwrap();
        assert_eq!(game.order(), &[1, 2, 0]);
    }

    #[test]
    fn test_still_life_keeps_score_and_earns_tokens() {
        let result = Match::new(config(), vec![block("a")], 0).unwrap().run().unwrap();
        assert_eq!(result.steps, 6);
        let p = &result.players[0];
        assert_eq!(p.score, 4);
        assert_eq!(p.history, vec![4; 7]);
        // interval 2: grants at steps 0, 2, 4
        assert_eq!(p.tokens, 6 + 3);
        assert_eq!(result.winner().map(|w| w.number), Some(1));
    }

    #[test]
    fn test_finished_is_terminal() {
        let mut game = Match::new(MatchConfig { iterations: 1, ..config() }, vec![block("a")], 0).unwrap();
        assert_eq!(game.step_once().unwrap(), MatchState::Finished);
        assert_eq!(game.step_once().unwrap(), MatchState::Finished);
        assert_eq!(game.step(), 1);
    }
}
