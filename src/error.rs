//! Error types for the game model and the engine layer.
//!
//! [`GameError`] covers local precondition violations that callers are
//! expected to pre-check with [`crate::game::Game::can_move`] and
//! [`crate::game::Game::can_takeback`]. [`EngineError`] is the only failure
//! that crosses from an engine process into orchestration code.

use std::io;
use std::path::PathBuf;

/// A rule or geometry violation raised by the board, move list, or game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("square ({x},{y}) is off the board")]
    InvalidSquare { x: usize, y: usize },
    #[error("square ({x},{y}) is already occupied")]
    SquareOccupied { x: usize, y: usize },
    #[error("square ({x},{y}) is already empty")]
    SquareEmpty { x: usize, y: usize },
    #[error("no moves to take back")]
    EmptyMovelist,
    #[error("bad turn value: {0}")]
    BadTurnValue(u32),
    #[error("game is already over")]
    GameOver,
}

/// Failure of an external engine process.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The process exited (or was killed) while a request was outstanding.
    #[error("engine in slot {slot} crashed (exit code {code:?})")]
    Crashed { slot: usize, code: Option<i32> },
    /// The process could not be started at all.
    #[error("failed to launch engine {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The executable could not be copied to its per-slot location.
    #[error("failed to copy engine {} to {}: {source}", from.display(), to.display())]
    LocalCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// Exit code carried by a crash, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            EngineError::Crashed { code, .. } => *code,
            _ => None,
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
pub type EngineResult<T> = Result<T, EngineError>;
