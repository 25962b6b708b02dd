//! Read-only replay cursor over a live game.
//!
//! The observer keeps a private copy of the bound game and steps it back and
//! forth one move at a time. Moves the cursor has not replayed yet are marked
//! on a [`Highlights`] grid with their 1-based order of play. The bound game
//! is only ever borrowed immutably.

use crate::board::Board;
use crate::game::{Game, SharedGame};

/// Per-square move numbers for the moves ahead of the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlights {
    width: usize,
    height: usize,
    marks: Vec<Option<usize>>,
}

impl Highlights {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            marks: vec![None; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.marks.iter_mut().for_each(|m| *m = None);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            self.marks[y * self.width + x]
        } else {
            None
        }
    }

    fn mark(&mut self, x: usize, y: usize, number: usize) {
        if x < self.width && y < self.height {
            self.marks[y * self.width + x] = Some(number);
        }
    }

    /// Number of marked squares.
    pub fn count(&self) -> usize {
        self.marks.iter().filter(|m| m.is_some()).count()
    }
}

pub struct GameObserver {
    game: Option<SharedGame>,
    cursor: Game,
    highlights: Highlights,
}

impl Default for GameObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObserver {
    pub fn new() -> Self {
        Self {
            game: None,
            cursor: Game::new(0, 0),
            highlights: Highlights::new(0, 0),
        }
    }

    /// Observe `game`. Call [`GameObserver::reset`] afterwards to sync the cursor.
    pub fn bind(&mut self, game: SharedGame) {
        self.game = Some(game);
    }

    /// Resynchronise the cursor with the bound game and drop all highlights.
    pub fn reset(&mut self) {
        let Some(game) = &self.game else { return };
        let game = game.borrow();
        self.cursor = game.make_copy(None);
        self.highlights = Highlights::new(game.width(), game.height());
    }

    /// Replay the next move of the bound game into the cursor.
    pub fn forward(&mut self) {
        let Some(game) = &self.game else { return };
        {
            let game = game.borrow();
            let replayed = self.cursor.moves().count();
            if let Some(next) = game.moves().get(replayed) {
                if let Err(err) = self.cursor.play(next.x, next.y) {
                    tracing::warn!(%err, "observer cursor diverged from bound game");
                }
            }
        }
        self.highlight_remaining();
    }

    /// Undo one move on the cursor.
    pub fn backward(&mut self) {
        if self.cursor.can_takeback() {
            let _ = self.cursor.takeback();
        }
        self.highlight_remaining();
    }

    fn highlight_remaining(&mut self) {
        self.highlights.clear();
        let Some(game) = &self.game else { return };
        let game = game.borrow();
        let replayed = self.cursor.moves().count();
        for (i, m) in game.moves().tail(replayed).iter().enumerate() {
            self.highlights.mark(m.x, m.y, i + 1);
        }
    }

    /// Board as seen at the cursor.
    pub fn board(&self) -> &Board {
        self.cursor.board()
    }

    pub fn cursor(&self) -> &Game {
        &self.cursor
    }

    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }
}
