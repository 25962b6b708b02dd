//! Fixed-size five-in-a-row board.
//!
//! Cells are stored row-major in a flat vector. Coordinates are `(x, y)` with
//! `x` the column and `y` the row, both zero-based.

use std::fmt;

use crate::constants::TRACE_DEPTH;
use crate::error::{GameError, GameResult};

/// One of the two players. `First` always moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl Side {
    /// The other player.
    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Zero-based index: `First` is 0, `Second` is 1.
    pub fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }

    /// Wire protocol number: `First` is 1, `Second` is 2.
    pub fn id(self) -> u32 {
        self.index() as u32 + 1
    }

    /// Parse a wire protocol side number.
    pub fn from_id(id: u32) -> GameResult<Side> {
        match id {
            1 => Ok(Side::First),
            2 => Ok(Side::Second),
            other => Err(GameError::BadTurnValue(other)),
        }
    }
}

/// Contents of a square: `None` is empty.
pub type Cell = Option<Side>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn square_count(&self) -> usize {
        self.width * self.height
    }

    /// Replace the dimensions and empty every square.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.clear();
    }

    /// Empty every square, keeping the dimensions.
    pub fn clear(&mut self) {
        self.cells = vec![None; self.width * self.height];
    }

    pub fn valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    fn idx(&self, x: usize, y: usize) -> GameResult<usize> {
        if self.valid(x, y) {
            Ok(y * self.width + x)
        } else {
            Err(GameError::InvalidSquare { x, y })
        }
    }

    pub fn piece(&self, x: usize, y: usize) -> GameResult<Cell> {
        Ok(self.cells[self.idx(x, y)?])
    }

    pub fn place(&mut self, side: Side, x: usize, y: usize) -> GameResult<()> {
        let i = self.idx(x, y)?;
        if self.cells[i].is_some() {
            return Err(GameError::SquareOccupied { x, y });
        }
        self.cells[i] = Some(side);
        Ok(())
    }

    pub fn remove(&mut self, x: usize, y: usize) -> GameResult<()> {
        let i = self.idx(x, y)?;
        if self.cells[i].is_none() {
            return Err(GameError::SquareEmpty { x, y });
        }
        self.cells[i] = None;
        Ok(())
    }

    /// Same-side neighbour at `steps` away from `(x, y)` along `(dx, dy)`.
    fn matches_at(&self, x: usize, y: usize, side: Side, dx: isize, dy: isize, steps: isize) -> bool {
        let nx = x.checked_add_signed(dx * steps);
        let ny = y.checked_add_signed(dy * steps);
        match (nx, ny) {
            (Some(nx), Some(ny)) if self.valid(nx, ny) => {
                self.cells[ny * self.width + nx] == Some(side)
            }
            _ => false,
        }
    }

    /// Count contiguous `side` stones on both sides of `(x, y)` along `(dx, dy)`.
    ///
    /// Each direction is walked at most [`TRACE_DEPTH`] steps and the starting
    /// square itself is not counted, so a sum of `TRACE_DEPTH` or more means
    /// a full line through the square.
    pub fn trace(&self, x: usize, y: usize, side: Side, dx: isize, dy: isize) -> usize {
        let depth = TRACE_DEPTH as isize;
        let forward = (1..=depth)
            .take_while(|&s| self.matches_at(x, y, side, dx, dy, s))
            .count();
        let backward = (1..=depth)
            .take_while(|&s| self.matches_at(x, y, side, -dx, -dy, s))
            .count();
        forward + backward
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let ch = match self.cells[y * self.width + x] {
                    Some(Side::First) => 'X',
                    Some(Side::Second) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
