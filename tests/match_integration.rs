//! Multi-step integration tests for the round engine.
//!
//! These tests run whole matches through the public API and check the
//! bookkeeping that ties the board, the token economy and the histories
//! together.
//!
//! Run with: cargo test --release match_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use cholerama::bot::{Bot, BotContext, BotError, GermBot, IdleBot, Placement};
use cholerama::config::MatchConfig;
use cholerama::engine::{Match, MatchState};
use cholerama::error::MatchError;
use cholerama::game::Pattern;
use cholerama::snapshot::Snapshot;

/// Single-patch board just large enough for a blinker to oscillate freely.
fn small_config() -> MatchConfig {
    MatchConfig {
        nx: 16,
        ny: 16,
        npatches: (1, 1),
        pattern_size: (3, 3),
        iterations: 2,
        initial_tokens: 10,
        additional_tokens: 0,
        threads: 1,
        ..MatchConfig::default()
    }
}

fn blinker() -> Pattern {
    Pattern::new([(1, 0), (1, 1), (1, 2)])
}

/// Places a fixed set of cells on the first step, then idles.
struct OneShotBot {
    name: String,
    pattern: Pattern,
    cells: Vec<(i64, i64)>,
    fired: bool,
}

impl OneShotBot {
    fn new(name: &str, pattern: Pattern, cells: Vec<(i64, i64)>) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            cells,
            fired: false,
        }
    }
}

impl Bot for OneShotBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> Pattern {
        self.pattern.clone()
    }

    fn decide(&mut self, _ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        if self.fired {
            return Ok(None);
        }
        self.fired = true;
        Ok(Some(Placement::from_cells(self.cells.iter().copied())))
    }
}

/// Panics whenever it is asked to decide.
struct PanicBot;

impl Bot for PanicBot {
    fn name(&self) -> &str {
        "Panicky"
    }

    fn pattern(&self) -> Pattern {
        Pattern::from_rows(&["##", "##"])
    }

    fn decide(&mut self, _ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        panic!("bot exploded");
    }
}

/// Records the order in which bots are consulted.
struct TracingBot {
    name: String,
    calls: Rc<RefCell<Vec<String>>>,
}

impl Bot for TracingBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> Pattern {
        Pattern::from_rows(&["##", "##"])
    }

    fn decide(&mut self, _ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        self.calls.borrow_mut().push(self.name.clone());
        Ok(None)
    }
}

fn germs(n: usize) -> Vec<Box<dyn Bot>> {
    (0..n)
        .map(|i| Box::new(GermBot::new(format!("germ{i}"), i as u64 + 1)) as Box<dyn Bot>)
        .collect()
}

fn germ_config(threads: usize) -> MatchConfig {
    MatchConfig {
        nx: 64,
        ny: 48,
        npatches: (2, 2),
        iterations: 60,
        initial_tokens: 100,
        additional_tokens: 30,
        threads,
        seed: 7,
        ..MatchConfig::default()
    }
}

#[test]
fn test_blinker_oscillates() {
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(IdleBot::new("blinker", blinker()))];
    let mut game = Match::new(small_config(), bots, 0).unwrap();

    // Centred in a 16x16 patch with a 3x3 box: origin (6, 6)
    let vertical = [(7, 6), (7, 7), (7, 8)];
    let horizontal = [(6, 7), (7, 7), (8, 7)];
    for &(x, y) in &vertical {
        assert_eq!(game.board().get(x, y), 1);
    }

    assert_eq!(game.step_once().unwrap(), MatchState::Running);
    assert_eq!(game.board().count(1), 3);
    for &(x, y) in &horizontal {
        assert_eq!(game.board().get(x, y), 1);
    }

    assert_eq!(game.step_once().unwrap(), MatchState::Finished);
    for &(x, y) in &vertical {
        assert_eq!(game.board().get(x, y), 1);
    }

    let result = game.into_result();
    assert_eq!(result.players[0].history, vec![3, 3, 3]);
    assert_eq!(result.players[0].peak, 3);
}

#[test]
fn test_over_budget_request_is_rejected() {
    // Balance after paying for the blinker: 10 - 3 = 7
    let row: Vec<(i64, i64)> = (0..8).map(|x| (x, 0)).collect();
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(OneShotBot::new("greedy", blinker(), row))];
    let config = MatchConfig {
        iterations: 1,
        ..small_config()
    };
    let mut game = Match::new(config, bots, 0).unwrap();
    assert_eq!(game.step_once().unwrap(), MatchState::Finished);

    // Rejected and recorded, not raised
    let report = game.last_report();
    assert_eq!(report.consulted, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.cells_placed, 0);

    let result = game.into_result();
    assert_eq!(result.players[0].tokens, 7);
    assert_eq!(result.players[0].score, 3);
    assert_eq!(result.board.count(1), 3);
}

#[test]
fn test_duplicate_cells_over_budget_are_rejected() {
    // Eight copies of one free cell against a balance of seven
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(OneShotBot::new("stutter", blinker(), vec![(0, 0); 8]))];
    let config = MatchConfig {
        iterations: 1,
        ..small_config()
    };
    let mut game = Match::new(config, bots, 0).unwrap();
    game.step_once().unwrap();

    assert_eq!(game.last_report().rejected, 1);
    assert_eq!(game.players()[0].ledger.balance(), 7);
}

#[test]
fn test_bot_color_reaches_snapshot() {
    let config = MatchConfig {
        iterations: 0,
        ..small_config()
    };
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(IdleBot::new("tinted", blinker()).with_color("#123456"))];
    let result = Match::new(config, bots, 0).unwrap().run().unwrap();
    assert_eq!(result.players[0].color, "#123456");
    assert_eq!(result.players[0].pattern, blinker());

    let snapshot = Snapshot::from_result(&result);
    assert_eq!(snapshot.players[0].color, "#123456");
    assert_eq!(snapshot.players[0].pattern, blinker());
}

#[test]
fn test_accepted_request_is_charged() {
    // Two isolated cells far from the blinker: placed, charged, then starve
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(OneShotBot::new(
        "thrifty",
        blinker(),
        vec![(0, 0), (-3, 0)],
    ))];
    let config = MatchConfig {
        iterations: 1,
        ..small_config()
    };
    let result = Match::new(config, bots, 0).unwrap().run().unwrap();

    assert_eq!(result.players[0].tokens, 5);
    assert_eq!(result.players[0].score, 3);
}

#[test]
fn test_occupied_request_is_rejected_whole() {
    // (7, 7) is the blinker's centre; (0, 0) would be free
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(OneShotBot::new(
        "clumsy",
        blinker(),
        vec![(0, 0), (7, 7)],
    ))];
    let config = MatchConfig {
        iterations: 1,
        ..small_config()
    };
    let result = Match::new(config, bots, 0).unwrap().run().unwrap();
    assert_eq!(result.players[0].tokens, 7);
}

#[test]
fn test_zero_iterations_scores_pattern_sizes() {
    let config = MatchConfig {
        nx: 32,
        ny: 16,
        npatches: (1, 2),
        pattern_size: (4, 4),
        iterations: 0,
        initial_tokens: 10,
        ..MatchConfig::default()
    };
    let bots: Vec<Box<dyn Bot>> = vec![
        Box::new(IdleBot::new("three", blinker())),
        Box::new(IdleBot::new("five", Pattern::from_rows(&[".#.", "..#", "###"]))),
    ];
    let result = Match::new(config, bots, 0).unwrap().run().unwrap();

    assert_eq!(result.steps, 0);
    let scores: Vec<u32> = result.players.iter().map(|p| p.score).collect();
    assert_eq!(scores, vec![3, 5]);
    assert_eq!(result.players[1].history, vec![5]);
    assert_eq!(result.players[1].tokens, 5);
}

#[test]
fn test_histories_match_board() {
    let game = Match::new(germ_config(1), germs(4), 0).unwrap();
    let result = game
        .run_with(|game| {
            for player in game.players() {
                assert_eq!(player.ncells() as usize, game.board().count(player.number));
                assert_eq!(player.history.len(), game.step() as usize + 1);
                assert!(player.ledger.peak() >= player.ncells());
            }
        })
        .unwrap();

    assert_eq!(result.steps, 60);
    for player in &result.players {
        assert_eq!(player.history.len(), 61);
        assert_eq!(player.peak, player.history.iter().copied().max().unwrap());
        assert_eq!(player.score, *player.history.last().unwrap());
    }
}

#[test]
fn test_match_is_deterministic_across_thread_counts() {
    let a = Match::new(germ_config(1), germs(4), 0).unwrap().run().unwrap();
    let b = Match::new(germ_config(4), germs(4), 0).unwrap().run().unwrap();

    assert_eq!(a.board, b.board);
    for (pa, pb) in a.players.iter().zip(&b.players) {
        assert_eq!(pa.history, pb.history);
        assert_eq!(pa.tokens, pb.tokens);
    }
}

#[test]
fn test_call_order_rotates() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let bots: Vec<Box<dyn Bot>> = ["a", "b", "c"]
        .iter()
        .map(|name| {
            Box::new(TracingBot {
                name: (*name).to_string(),
                calls: Rc::clone(&calls),
            }) as Box<dyn Bot>
        })
        .collect();
    let config = MatchConfig {
        nx: 48,
        ny: 16,
        npatches: (1, 3),
        pattern_size: (4, 4),
        iterations: 2,
        ..MatchConfig::default()
    };

    let mut game = Match::new(config, bots, 1).unwrap();
    game.step_once().unwrap();
    game.step_once().unwrap();
    assert_eq!(*calls.borrow(), vec!["b", "c", "a", "b", "c", "a"]);
}

#[test]
fn test_safe_mode_swallows_panics() {
    let config = MatchConfig {
        nx: 16,
        ny: 16,
        npatches: (1, 1),
        pattern_size: (4, 4),
        iterations: 3,
        safe: true,
        ..MatchConfig::default()
    };
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(PanicBot)];
    let result = Match::new(config, bots, 0).unwrap().run().unwrap();
    assert_eq!(result.steps, 3);
    assert_eq!(result.players[0].score, 4);
}

#[test]
fn test_unsafe_mode_reports_fault() {
    let config = MatchConfig {
        nx: 16,
        ny: 16,
        npatches: (1, 1),
        pattern_size: (4, 4),
        iterations: 3,
        safe: false,
        ..MatchConfig::default()
    };
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(PanicBot)];
    let err = Match::new(config, bots, 0).unwrap().run().unwrap_err();
    match err {
        MatchError::BotFault { player, source } => {
            assert_eq!(player, "Panicky");
            assert_eq!(source, BotError::Panicked("bot exploded".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dead_players_are_not_consulted() {
    // A lone cell dies on the first step; its bot must not be asked again
    let calls = Rc::new(RefCell::new(Vec::new()));
    let bots: Vec<Box<dyn Bot>> = vec![Box::new(LoneBot {
        calls: Rc::clone(&calls),
    })];
    let config = MatchConfig {
        nx: 16,
        ny: 16,
        npatches: (1, 1),
        pattern_size: (4, 4),
        iterations: 4,
        ..MatchConfig::default()
    };
    let result = Match::new(config, bots, 0).unwrap().run().unwrap();
    assert_eq!(*calls.borrow(), vec![0]);
    assert_eq!(result.players[0].history, vec![1, 0, 0, 0, 0]);
}

struct LoneBot {
    calls: Rc<RefCell<Vec<u32>>>,
}

impl Bot for LoneBot {
    fn name(&self) -> &str {
        "lone"
    }

    fn pattern(&self) -> Pattern {
        Pattern::new([(0, 0)])
    }

    fn decide(&mut self, ctx: &BotContext<'_>) -> Result<Option<Placement>, BotError> {
        self.calls.borrow_mut().push(ctx.iteration);
        Ok(None)
    }
}
