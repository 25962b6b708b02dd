//! Integration tests for xo-rust
//!
//! These tests drive real child processes: the crate's own binary running
//! its built-in `brain` engine, and (on unix) shell one-liners that crash.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use xo_rust::binding::{DualEngine, DualGame, EngineBinding, SingleEngine};
use xo_rust::board::Side;
use xo_rust::config::{EngineRecord, EngineRegistry, Settings};
use xo_rust::connection::ProcessState;
use xo_rust::controller::EngineController;
use xo_rust::error::EngineError;
use xo_rust::game::{Game, SharedGame};
use xo_rust::manager::EngineManager;
use xo_rust::observer::GameObserver;

// =============================================================================
// Helper functions
// =============================================================================

fn brain_record(name: &str) -> EngineRecord {
    EngineRecord::new(name, PathBuf::from(env!("CARGO_BIN_EXE_xo-rust"))).with_args(["brain"])
}

fn start_brain(slot: usize) -> EngineController {
    let mut controller = EngineController::new(slot);
    controller.start(&brain_record("brain")).unwrap();
    assert!(controller.ready());
    controller
}

/// A fresh, empty directory under the system temp dir.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("xo-rust-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Play `moves` alternately starting with First.
fn setup_game(width: usize, height: usize, moves: &[(usize, usize)]) -> Game {
    let mut game = Game::new(width, height);
    for &(x, y) in moves {
        game.play(x, y).unwrap();
    }
    game
}

// =============================================================================
// Game rules
// =============================================================================

#[test]
fn test_diagonal_win() {
    let game = setup_game(
        16,
        16,
        &[(0, 0), (0, 5), (1, 1), (1, 5), (2, 2), (2, 5), (3, 3), (3, 5), (4, 4)],
    );
    assert!(game.is_over());
    assert_eq!(game.last_mover(), Some(Side::First));
    assert!(game.clone().play(9, 9).is_err());
}

#[test]
fn test_anti_diagonal_win_for_second() {
    let game = setup_game(
        16,
        16,
        &[
            (10, 10),
            (4, 0),
            (11, 10),
            (3, 1),
            (12, 10),
            (2, 2),
            (0, 15),
            (1, 3),
            (15, 15),
            (0, 4),
        ],
    );
    assert!(game.is_over());
    assert_eq!(game.last_mover(), Some(Side::Second));
}

#[test]
fn test_takeback_undoes_win() {
    let mut game = setup_game(
        16,
        16,
        &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1), (4, 0)],
    );
    assert!(game.is_over());
    game.takeback().unwrap();
    assert!(!game.is_over());
    assert_eq!(game.turn(), Side::First);
    assert_eq!(game.board().piece(4, 0), Ok(None));
}

#[test]
fn test_observer_replays_full_game() {
    let game: SharedGame = Rc::new(RefCell::new(setup_game(8, 8, &[(1, 1), (2, 2), (3, 3)])));
    let mut observer = GameObserver::new();
    observer.bind(game.clone());
    observer.reset();
    observer.backward();
    observer.backward();
    observer.backward();
    assert_eq!(observer.cursor().moves().count(), 0);
    assert_eq!(observer.highlights().get(1, 1), Some(1));
    assert_eq!(observer.highlights().get(3, 3), Some(3));
    observer.forward();
    assert_eq!(observer.board().piece(1, 1), Ok(Some(Side::First)));
    assert_eq!(observer.highlights().get(1, 1), None);
    assert_eq!(observer.highlights().get(2, 2), Some(1));
}

// =============================================================================
// Real engine processes
// =============================================================================

#[test]
fn test_brain_handshake() {
    let mut controller = start_brain(0);
    assert_eq!(controller.info().get("name").map(String::as_str), Some("xo-random"));
    assert!(controller.prompt().starts_with("[0]xo-random"));
    controller.shutdown();
}

#[test]
fn test_brain_think_places_one_move() {
    let mut controller = start_brain(0);
    let mut game = Game::new(10, 10);
    EngineBinding::Single(SingleEngine::new(&mut controller, &mut game))
        .think()
        .unwrap();
    assert_eq!(game.moves().count(), 1);
    assert_eq!(game.moves()[0].side, Side::First);

    // The second request uploads the history first.
    EngineBinding::Single(SingleEngine::new(&mut controller, &mut game))
        .think()
        .unwrap();
    assert_eq!(game.moves().count(), 2);
    assert_eq!(game.moves()[1].side, Side::Second);
    assert!(!controller.locked());
    controller.shutdown();
}

#[test]
fn test_brain_single_play_finishes_game() {
    let mut controller = start_brain(1);
    let mut game = Game::new(5, 5);
    game.play(2, 2).unwrap();
    EngineBinding::Single(SingleEngine::new(&mut controller, &mut game))
        .play()
        .unwrap();
    assert!(game.is_over());
    assert_eq!(game.moves()[0].x, 2);
    controller.shutdown();
}

#[test]
fn test_two_brains_play_a_full_game() {
    let mut first = start_brain(0);
    let mut second = start_brain(1);
    let mut game = Game::new(6, 6);
    EngineBinding::Dual(DualEngine::new(&mut first, &mut second, &mut game))
        .play()
        .unwrap();
    assert!(game.is_over());
    for (i, m) in game.moves().iter().enumerate() {
        let expected = if i % 2 == 0 { Side::First } else { Side::Second };
        assert_eq!(m.side, expected);
    }
    first.shutdown();
    second.shutdown();
}

#[test]
fn test_dual_game_moves_in_both_games() {
    let mut a = start_brain(0);
    let mut b = start_brain(1);
    let mut game_a = Game::new(7, 7);
    let mut game_b = setup_game(9, 9, &[(4, 4)]);
    EngineBinding::DualGame(DualGame::new(&mut a, &mut b, &mut game_a, &mut game_b))
        .think()
        .unwrap();
    assert_eq!(game_a.moves().count(), 1);
    assert_eq!(game_b.moves().count(), 2);
    a.shutdown();
    b.shutdown();
}

#[test]
fn test_shutdown_ends_process() {
    let mut controller = start_brain(0);
    controller.shutdown();
    for _ in 0..200 {
        if controller.process_state() != ProcessState::Running {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    assert_eq!(controller.process_state(), ProcessState::Exited(Some(0)));
    assert!(!controller.ready());
}

#[test]
fn test_commands_after_shutdown_fail_fast() {
    let mut controller = start_brain(0);
    controller.shutdown();
    assert!(!controller.ready());
    assert!(controller.send_command("about").unwrap().is_none());
    let mut game = Game::new(8, 8);
    EngineBinding::Single(SingleEngine::new(&mut controller, &mut game))
        .think()
        .unwrap();
    assert_eq!(game.moves().count(), 0);
}

#[test]
fn test_local_copy_start() {
    let dir = scratch_dir("local-copy");
    let mut controller = EngineController::new(1).with_local_dir(&dir);
    controller
        .start(&brain_record("brain").with_local_copy(true))
        .unwrap();
    assert!(controller.local_copy_path().starts_with(&dir));
    assert!(controller.local_copy_path().exists());
    assert!(controller.ready());
    assert_eq!(controller.info().get("name").map(String::as_str), Some("xo-random"));

    let mut game = Game::new(8, 8);
    EngineBinding::Single(SingleEngine::new(&mut controller, &mut game))
        .think()
        .unwrap();
    assert_eq!(game.moves().count(), 1);
    controller.shutdown();
}

#[test]
fn test_local_copy_of_missing_engine() {
    let dir = scratch_dir("missing-copy");
    let mut controller = EngineController::new(0).with_local_dir(&dir);
    let record = EngineRecord::new("missing", dir.join("no-such-engine")).with_local_copy(true);
    let err = controller.start(&record).unwrap_err();
    assert!(matches!(err, EngineError::LocalCopy { .. }));
    assert!(!controller.ready());
    assert!(!controller.local_copy_path().exists());
}

#[test]
fn test_launch_failure() {
    let mut controller = EngineController::new(0);
    let err = controller
        .start(&EngineRecord::new("missing", "/nonexistent/xo-engine"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Launch { .. }));
    assert!(!controller.ready());
}

#[cfg(unix)]
#[test]
fn test_crash_during_handshake() {
    let record = EngineRecord::new("crasher", "/bin/sh").with_args(["-c", "read line; exit 3"]);
    let mut controller = EngineController::new(1);
    let err = controller.start(&record).unwrap_err();
    assert_eq!(err.exit_code(), Some(3));
    assert!(!controller.ready());
    assert!(!controller.locked());
}

#[cfg(unix)]
#[test]
fn test_crash_mid_game_is_contained_by_manager() {
    // Answers the handshake and the board size, then dies on the move request.
    let script = "read l; echo unknown; read l; echo ok; read l; exit 9";
    let mut registry = EngineRegistry::new();
    registry.add(EngineRecord::new("crasher", "/bin/sh").with_args(["-c", script]));
    registry.add(brain_record("brain"));
    let mut settings = Settings::default();
    settings.select_engine(0, 0);
    settings.select_engine(1, 1);

    let mut manager = EngineManager::new();
    manager.resize(8, 8);
    manager.run_engines(&registry, &settings);
    assert!(manager.controller(0).ready());
    assert!(manager.controller(1).ready());

    manager.think(Some(0));
    assert!(!manager.controller(0).ready());
    assert_eq!(manager.game(0).borrow().moves().count(), 0);

    manager.think(Some(1));
    assert_eq!(manager.game(1).borrow().moves().count(), 1);
    manager.shutdown();
}
