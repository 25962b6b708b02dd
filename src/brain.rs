//! Built-in engine that speaks the engine protocol on stdin/stdout.
//!
//! It plays uniformly random legal moves. It is small enough to read in one
//! sitting and complete enough to drive every part of the manager side: the
//! handshake, history sync, `message` notices, self-play and diagnostics.
//!
//! ## Example
//!
//! ```ignore
//! use xo_rust::brain::Brain;
//! let mut brain = Brain::new();
//! brain.run();
//! ```

use std::io::{self, BufRead, Write};

use crate::board::Side;
use crate::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_BOARD_SIDE};
use crate::error::GameError;
use crate::game::Game;
use crate::movelist::Move;
use crate::protocol::{self, ProtocolError, Request};

/// History lines received since a `board` command.
struct BoardUpload {
    moves: Vec<Move>,
    error: Option<ProtocolError>,
}

pub struct Brain {
    game: Game,
    rng: fastrand::Rng,
    upload: Option<BoardUpload>,
}

impl Default for Brain {
    fn default() -> Self {
        Self::new()
    }
}

impl Brain {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Deterministic move choice, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            game: Game::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            rng,
            upload: None,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Serve commands from stdin until `end` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    pub fn serve(&mut self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.upload.is_none() && Request::parse(line) == Request::End {
                break;
            }
            for answer in self.execute(line) {
                writeln!(output, "{answer}")?;
            }
            output.flush()?;
        }
        Ok(())
    }

    /// Handle one input line and return the lines to send back.
    pub fn execute(&mut self, line: &str) -> Vec<String> {
        if self.upload.is_some() {
            match line.to_lowercase().as_str() {
                protocol::DONE => return self.finish_upload(true),
                protocol::LOAD => return self.finish_upload(false),
                _ => {
                    if let Some(upload) = self.upload.as_mut() {
                        if upload.error.is_none() {
                            match protocol::parse_board_entry(line) {
                                Ok(m) => upload.moves.push(m),
                                Err(err) => upload.error = Some(err),
                            }
                        }
                    }
                    return Vec::new();
                }
            }
        }

        match Request::parse(line) {
            Request::About => vec![format!(
                r#"name="xo-random", version="{}", author="xo-rust""#,
                env!("CARGO_PKG_VERSION")
            )],
            Request::Start { width, height }
                if width > MAX_BOARD_SIDE || height > MAX_BOARD_SIDE =>
            {
                vec![format!("error unsupported board size {width}x{height}")]
            }
            Request::Start { width, height } => {
                self.game = Game::new(width, height);
                vec!["ok".to_string()]
            }
            Request::Begin => {
                self.game.new_game();
                self.reply_move()
            }
            Request::Board => {
                self.upload = Some(BoardUpload {
                    moves: Vec::new(),
                    error: None,
                });
                Vec::new()
            }
            Request::Turn { x, y } => match self.game.play(x, y) {
                Ok(()) => self.reply_move(),
                Err(err) => vec![format!("error {err}")],
            },
            Request::SinglePlay => {
                let start = self.game.moves().count();
                while let Some((x, y)) = self.pick() {
                    if self.game.play(x, y).is_err() {
                        break;
                    }
                }
                let played: Vec<String> = self
                    .game
                    .moves()
                    .tail(start)
                    .iter()
                    .map(|m| format!("{} {}", m.x, m.y))
                    .collect();
                if played.is_empty() {
                    vec!["play".to_string()]
                } else {
                    vec![format!("play {}", played.join(" "))]
                }
            }
            Request::SquareInfo { x, y } => match self.game.board().piece(x, y) {
                Ok(cell) => {
                    let owner = match cell {
                        Some(Side::First) => "first",
                        Some(Side::Second) => "second",
                        None => "empty",
                    };
                    vec![format!("square {x},{y} {owner}")]
                }
                Err(err) => vec![format!("error {err}")],
            },
            Request::End => Vec::new(),
            Request::Unknown(text) => vec![format!("unknown command: {text}")],
        }
    }

    fn finish_upload(&mut self, want_best_move: bool) -> Vec<String> {
        let Some(upload) = self.upload.take() else {
            return Vec::new();
        };
        if let Some(err) = upload.error {
            return vec![format!("error {err}")];
        }
        self.game.new_game();
        for m in upload.moves {
            if m.side != self.game.turn() {
                return vec![format!("error {}", GameError::BadTurnValue(m.side.id()))];
            }
            if let Err(err) = self.game.play(m.x, m.y) {
                return vec![format!("error {err}")];
            }
        }
        if want_best_move {
            self.reply_move()
        } else {
            vec!["ok".to_string()]
        }
    }

    /// A random empty square, unless the game is over.
    fn pick(&mut self) -> Option<(usize, usize)> {
        if self.game.is_over() {
            return None;
        }
        let board = self.game.board();
        let empty: Vec<(usize, usize)> = (0..board.height())
            .flat_map(|y| (0..board.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| self.game.can_move(x, y))
            .collect();
        if empty.is_empty() {
            None
        } else {
            Some(empty[self.rng.usize(..empty.len())])
        }
    }

    fn reply_move(&mut self) -> Vec<String> {
        let free = self.free_squares();
        match self.pick() {
            Some((x, y)) => match self.game.play(x, y) {
                Ok(()) => vec![
                    format!("message choosing among {free} empty squares"),
                    format!("{x},{y}"),
                ],
                Err(err) => vec![format!("error {err}")],
            },
            None => vec!["error no legal moves".to_string()],
        }
    }

    fn free_squares(&self) -> usize {
        self.game.board().square_count() - self.game.moves().count()
    }
}
