//! Game rules: turn order, win detection, and takeback.
//!
//! A [`Game`] is mutated only through [`Game::play`] and [`Game::takeback`].
//! Copies are built by replaying moves through the same path, so every copy
//! goes through the same legality and termination checks as the original.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::board::{Board, Side};
use crate::constants::{AXES, DEFAULT_HEIGHT, DEFAULT_WIDTH, TRACE_DEPTH};
use crate::error::{GameError, GameResult};
use crate::movelist::{Move, MoveList};

/// A game shared between the engine layer and a [`crate::observer::GameObserver`].
///
/// Callers keep to one writer at a time; the `RefCell` turns a violation into
/// a panic instead of silent corruption.
pub type SharedGame = Rc<RefCell<Game>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    moves: MoveList,
    turn: Side,
    over: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Game {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            board: Board::new(width, height),
            moves: MoveList::new(),
            turn: Side::First,
            over: false,
        }
    }

    /// Wrap a fresh game for sharing.
    pub fn shared(width: usize, height: usize) -> SharedGame {
        Rc::new(RefCell::new(Self::new(width, height)))
    }

    /// Start over on the same board size.
    pub fn new_game(&mut self) {
        self.board.clear();
        self.moves = MoveList::new();
        self.turn = Side::First;
        self.over = false;
    }

    /// Start over on a board of a different size.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.board.resize(width, height);
        self.moves = MoveList::new();
        self.turn = Side::First;
        self.over = false;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> &MoveList {
        &self.moves
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }

    /// Side to move next.
    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn turn_index(&self) -> usize {
        self.turn.index()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn can_move(&self, x: usize, y: usize) -> bool {
        !self.over && matches!(self.board.piece(x, y), Ok(None))
    }

    pub fn can_takeback(&self) -> bool {
        !self.moves.is_empty()
    }

    fn is_win(&self, x: usize, y: usize, side: Side) -> bool {
        AXES
            .iter()
            .any(|&(dx, dy)| self.board.trace(x, y, side, dx, dy) >= TRACE_DEPTH)
    }

    /// Place the side-to-move's stone at `(x, y)`.
    ///
    /// Ends the game if the stone completes a line or fills the board.
    pub fn play(&mut self, x: usize, y: usize) -> GameResult<()> {
        if self.over {
            return Err(GameError::GameOver);
        }
        let side = self.turn;
        self.board.place(side, x, y)?;
        self.moves.append(x, y, side);
        self.turn = side.opponent();
        if self.is_win(x, y, side) || self.moves.count() >= self.board.square_count() {
            self.over = true;
        }
        Ok(())
    }

    /// Undo the most recent move. Always leaves the game in progress.
    pub fn takeback(&mut self) -> GameResult<Move> {
        let last = self.moves.pop()?;
        self.turn = self.turn.opponent();
        self.board.remove(last.x, last.y)?;
        self.over = false;
        Ok(last)
    }

    /// Independent copy replaying all moves, or only the first `limit`.
    pub fn make_copy(&self, limit: Option<usize>) -> Game {
        let count = limit.map_or(self.moves.count(), |n| n.min(self.moves.count()));
        let mut copy = Game::new(self.width(), self.height());
        for m in self.moves.iter().take(count) {
            // Replaying a sequence this game already accepted cannot fail.
            let _ = copy.play(m.x, m.y);
        }
        copy
    }

    /// Replace this game with a replay of `other`.
    pub fn load(&mut self, other: &Game) -> GameResult<()> {
        self.resize(other.width(), other.height());
        for m in other.moves.iter() {
            self.play(m.x, m.y)?;
        }
        Ok(())
    }

    /// Side that placed the final stone, once the game is over.
    pub fn last_mover(&self) -> Option<Side> {
        self.moves.iter().last().map(|m| m.side)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(game: &mut Game, moves: &[(usize, usize)]) {
        for &(x, y) in moves {
            game.play(x, y).unwrap();
        }
    }

    #[test]
    fn test_initial_state() {
        let game = Game::default();
        assert_eq!(game.width(), 16);
        assert_eq!(game.height(), 16);
        assert_eq!(game.turn(), Side::First);
        assert!(!game.is_over());
        assert!(!game.can_takeback());
    }

    #[test]
    fn test_turn_alternates() {
        let mut game = Game::new(16, 16);
        for n in 0..10 {
            let expected = if n % 2 == 0 { Side::First } else { Side::Second };
            assert_eq!(game.turn(), expected);
            game.play(n, n).unwrap();
        }
        assert_eq!(game.moves().count(), 10);
    }

    #[test]
    fn test_horizontal_win() {
        let mut game = Game::new(16, 16);
        play_all(
            &mut game,
            &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1)],
        );
        assert!(!game.is_over());
        game.play(4, 0).unwrap();
        assert!(game.is_over());
        assert_eq!(game.last_mover(), Some(Side::First));
        assert!(!game.can_move(5, 0));
        assert_eq!(game.play(5, 0), Err(GameError::GameOver));
    }

    #[test]
    fn test_win_by_filling_gap() {
        let mut game = Game::new(16, 16);
        // Second fills the middle of an anti-diagonal line.
        play_all(
            &mut game,
            &[(0, 0), (10, 2), (0, 2), (9, 3), (0, 4), (7, 5), (0, 6), (6, 6), (15, 15)],
        );
        assert!(!game.is_over());
        game.play(8, 4).unwrap();
        assert!(game.is_over());
        assert_eq!(game.last_mover(), Some(Side::Second));
    }

    #[test]
    fn test_four_is_not_a_win() {
        let mut game = Game::new(16, 16);
        play_all(&mut game, &[(5, 5), (0, 0), (5, 6), (0, 2), (5, 7), (0, 4), (5, 8)]);
        assert!(!game.is_over());
    }

    #[test]
    fn test_full_board_ends_game() {
        let mut game = Game::new(1, 1);
        game.play(0, 0).unwrap();
        assert!(game.is_over());
    }

    #[test]
    fn test_takeback_restores_state() {
        let mut game = Game::new(16, 16);
        play_all(&mut game, &[(7, 7), (8, 8), (7, 8)]);
        let before = game.clone();
        game.play(3, 3).unwrap();
        let undone = game.takeback().unwrap();
        assert_eq!(undone, Move { x: 3, y: 3, side: Side::Second });
        assert_eq!(game, before);
    }

    #[test]
    fn test_takeback_reopens_finished_game() {
        let mut game = Game::new(1, 1);
        game.play(0, 0).unwrap();
        game.takeback().unwrap();
        assert!(!game.is_over());
        assert!(game.can_move(0, 0));
        assert_eq!(game.turn(), Side::First);
    }

    #[test]
    fn test_takeback_empty() {
        let mut game = Game::new(5, 5);
        assert_eq!(game.takeback(), Err(GameError::EmptyMovelist));
    }

    #[test]
    fn test_illegal_moves() {
        let mut game = Game::new(5, 5);
        game.play(2, 2).unwrap();
        assert!(!game.can_move(2, 2));
        assert!(!game.can_move(5, 0));
        assert_eq!(game.play(2, 2), Err(GameError::SquareOccupied { x: 2, y: 2 }));
        assert_eq!(game.play(0, 9), Err(GameError::InvalidSquare { x: 0, y: 9 }));
        assert_eq!(game.moves().count(), 1);
        assert_eq!(game.turn(), Side::Second);
    }

    #[test]
    fn test_make_copy_prefix() {
        let mut game = Game::new(10, 10);
        play_all(&mut game, &[(1, 1), (2, 2), (3, 3), (4, 4)]);
        let copy = game.make_copy(Some(2));
        assert_eq!(copy.moves().count(), 2);
        assert_eq!(copy.turn(), Side::First);
        assert_eq!(copy.board().piece(3, 3), Ok(None));
        assert_eq!(game.make_copy(None), game);
        assert_eq!(game.make_copy(Some(99)), game);
    }

    #[test]
    fn test_load_replaces_dimensions_and_moves() {
        let mut source = Game::new(7, 9);
        play_all(&mut source, &[(0, 0), (6, 8)]);
        let mut target = Game::new(16, 16);
        target.play(10, 10).unwrap();
        target.load(&source).unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn test_new_game_keeps_size() {
        let mut game = Game::new(8, 6);
        game.play(1, 1).unwrap();
        game.new_game();
        assert_eq!((game.width(), game.height()), (8, 6));
        assert_eq!(game.moves().count(), 0);
        assert_eq!(game.turn(), Side::First);
    }
}
