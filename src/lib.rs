//! xo-rust: a five-in-a-row engine arena.
//!
//! This crate runs external five-in-a-row engines as child processes and
//! referees their games over a line-oriented text protocol.
//!
//! ## Modules
//!
//! - [`board`], [`movelist`], [`game`] - Rules: placement, turn order, win detection, takeback
//! - [`observer`] - Replay cursor for browsing a game's history
//! - [`protocol`] - Pure encoding and decoding of protocol lines
//! - [`connection`] - Child process lifecycle and line I/O
//! - [`controller`] - Synchronous request/response session with one engine
//! - [`binding`] - Which engine moves in which game
//! - [`manager`] - Two match slots with crash containment
//! - [`config`], [`library`] - Engine registry, slot settings, saved games
//! - [`brain`] - A built-in random engine speaking the protocol
//!
//! ## Example
//!
//! ```
//! use xo_rust::game::Game;
//! use xo_rust::board::Side;
//!
//! let mut game = Game::new(16, 16);
//! for x in 0..4 {
//!     game.play(x, 0).unwrap();
//!     game.play(x, 1).unwrap();
//! }
//! game.play(4, 0).unwrap();
//! assert!(game.is_over());
//! assert_eq!(game.last_mover(), Some(Side::First));
//! ```

pub mod binding;
pub mod board;
pub mod brain;
pub mod config;
pub mod connection;
pub mod constants;
pub mod controller;
pub mod error;
pub mod game;
pub mod library;
pub mod manager;
pub mod movelist;
pub mod observer;
pub mod protocol;
