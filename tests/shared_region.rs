//! A match publishing to a shared region, observed and steered through a
//! second handle the way a viewer process would.
//!
//! Run with: cargo test --release shared_region

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use cholerama::bot::{Bot, IdleBot};
use cholerama::config::MatchConfig;
use cholerama::engine::{Match, MatchState};
use cholerama::game::Pattern;
use cholerama::shared::SharedState;

fn config() -> MatchConfig {
    MatchConfig {
        nx: 32,
        ny: 16,
        npatches: (1, 2),
        pattern_size: (4, 4),
        iterations: 8,
        initial_tokens: 20,
        additional_tokens: 4,
        threads: 1,
        poll_interval_ms: 1,
        ..MatchConfig::default()
    }
}

fn roster() -> Vec<Box<dyn Bot>> {
    vec![
        Box::new(IdleBot::new("blinker", Pattern::from_rows(&[".#.", ".#.", ".#."]))),
        Box::new(IdleBot::new("glider", Pattern::from_rows(&[".#.", "..#", "###"]))),
    ]
}

#[test]
fn test_viewer_sees_final_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.region");
    let config = config();
    let shared = SharedState::create(&path, config.nx, config.ny, 2, config.iterations).unwrap();
    let viewer = SharedState::attach(&path).unwrap();

    let result = Match::new(config, roster(), 0)
        .unwrap()
        .with_shared(shared)
        .unwrap()
        .run()
        .unwrap();

    assert!(viewer.flow().is_finished());
    assert_eq!(viewer.progress(), 8);
    assert_eq!(viewer.board(), result.board.cells());
    for (slot, player) in result.players.iter().enumerate() {
        assert_eq!(viewer.history(slot), player.history);
        assert_eq!(viewer.tokens()[slot], player.tokens);
        assert_eq!(viewer.live_cells()[slot], player.score);
    }
}

#[test]
fn test_progress_tracks_steps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.region");
    let config = config();
    let shared = SharedState::create(&path, config.nx, config.ny, 2, config.iterations).unwrap();
    let viewer = SharedState::attach(&path).unwrap();

    let mut game = Match::new(config, roster(), 0).unwrap().with_shared(shared).unwrap();
    assert_eq!(viewer.progress(), 0);
    assert_eq!(viewer.history(0), vec![3]);

    game.step_once().unwrap();
    game.step_once().unwrap();
    assert_eq!(viewer.progress(), 2);
    assert_eq!(viewer.history(0), vec![3, 3, 3]);
    assert_eq!(viewer.board(), game.board().cells());
    assert!(!viewer.flow().is_finished());
}

#[test]
fn test_exit_request_stops_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.region");
    let config = config();
    let shared = SharedState::create(&path, config.nx, config.ny, 2, config.iterations).unwrap();
    let viewer = SharedState::attach(&path).unwrap();

    let result = Match::new(config, roster(), 0)
        .unwrap()
        .with_shared(shared)
        .unwrap()
        .run_with(|game| {
            if game.step() == 3 {
                viewer.flow().request_exit();
            }
        })
        .unwrap();

    assert!(result.exit_requested);
    assert_eq!(result.steps, 3);
    assert_eq!(result.players[0].history.len(), 4);
    assert!(viewer.flow().is_finished());
}

#[test]
fn test_pause_holds_the_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.region");
    let config = config();
    let shared = SharedState::create(&path, config.nx, config.ny, 2, config.iterations).unwrap();
    shared.flow().set_paused(true);
    let viewer = SharedState::attach(&path).unwrap();

    let mut game = Match::new(config, roster(), 0).unwrap().with_shared(shared).unwrap();
    assert_eq!(game.state(), MatchState::Paused);
    assert_eq!(game.step_once().unwrap(), MatchState::Paused);
    assert_eq!(game.step(), 0);

    viewer.flow().set_paused(false);
    assert_eq!(game.step_once().unwrap(), MatchState::Running);
    assert_eq!(game.step(), 1);

    viewer.flow().set_paused(true);
    assert_eq!(game.step_once().unwrap(), MatchState::Paused);
    viewer.flow().request_exit();
    assert_eq!(game.step_once().unwrap(), MatchState::Finished);
    assert_eq!(game.step(), 1);
}

#[test]
fn test_remove_deletes_backing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.region");
    let shared = SharedState::create(&path, 8, 8, 1, 4).unwrap();
    assert!(path.exists());
    shared.remove().unwrap();
    assert!(!path.exists());
    assert!(SharedState::attach(&path).is_err());
}
