//! Ordered log of placed stones.

use std::ops::Index;

use crate::board::Side;
use crate::error::{GameError, GameResult};

/// A stone placed at `(x, y)` by `side`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub x: usize,
    pub y: usize,
    pub side: Side,
}

/// Moves in play order. Only the tail is ever appended or popped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, x: usize, y: usize, side: Side) {
        self.moves.push(Move { x, y, side });
    }

    /// Remove and return the most recent move.
    pub fn pop(&mut self) -> GameResult<Move> {
        self.moves.pop().ok_or(GameError::EmptyMovelist)
    }

    pub fn count(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Move> {
        self.moves.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }

    /// Moves from index `from` to the end.
    pub fn tail(&self, from: usize) -> &[Move] {
        self.moves.get(from..).unwrap_or(&[])
    }

    /// Space-separated `x y` pairs, the format used by `play` answers.
    pub fn to_text(&self) -> String {
        self.moves
            .iter()
            .map(|m| format!("{} {}", m.x, m.y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, i: usize) -> &Move {
        &self.moves[i]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_pop_are_lifo() {
        let mut list = MoveList::new();
        list.append(1, 2, Side::First);
        list.append(3, 4, Side::Second);
        assert_eq!(list.count(), 2);
        assert_eq!(list[0], Move { x: 1, y: 2, side: Side::First });
        assert_eq!(list.pop(), Ok(Move { x: 3, y: 4, side: Side::Second }));
        assert_eq!(list.count(), 1);
    }

    #[test]
    fn test_pop_empty() {
        let mut list = MoveList::new();
        assert_eq!(list.pop(), Err(GameError::EmptyMovelist));
    }

    #[test]
    fn test_iteration_in_play_order() {
        let mut list = MoveList::new();
        list.append(0, 0, Side::First);
        list.append(5, 5, Side::Second);
        list.append(9, 1, Side::First);
        let xs: Vec<usize> = list.iter().map(|m| m.x).collect();
        assert_eq!(xs, vec![0, 5, 9]);
        assert_eq!(list.tail(1).len(), 2);
        assert!(list.tail(7).is_empty());
        assert_eq!(list.to_text(), "0 0 5 5 9 1");
    }
}
