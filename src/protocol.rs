//! Engine wire protocol.
//!
//! A line-oriented text protocol spoken over the engine's standard streams.
//! This module is pure: it turns lines into values and values into lines and
//! never touches a process.
//!
//! ## Commands (manager → engine)
//!
//! - `about` - request `key="value", ...` identification
//! - `start <w> <h>` - declare the board size
//! - `begin` - request an opening move on an empty board
//! - `board` / `<x>,<y>,<side>` ... / `done` - sync history, then request a move
//! - `board` / `<x>,<y>,<side>` ... / `load` - sync history only
//! - `turn <x>,<y>` - opponent played, request a reply move
//! - `single_play` - request a self-play continuation
//! - `squareinfo <x> <y>` - request diagnostics for a square
//! - `end` - terminate
//!
//! ## Answers (engine → manager)
//!
//! - `<x>,<y>` - a move
//! - `play <x> <y> <x> <y> ...` - a self-play sequence
//! - `message <text>` - out-of-band notice; never completes a request
//! - anything else (`ok`, `error ...`, `unknown ...`) - a plain answer

use crate::board::Side;
use crate::error::GameError;
use crate::movelist::{Move, MoveList};

pub const ABOUT: &str = "about";
pub const BEGIN: &str = "begin";
pub const BOARD: &str = "board";
pub const DONE: &str = "done";
pub const LOAD: &str = "load";
pub const SINGLE_PLAY: &str = "single_play";
pub const END: &str = "end";
pub const MESSAGE: &str = "message";

/// Why a line could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed line: {0:?}")]
    Malformed(String),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// A non-`message` line from the engine, split into its first token and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The full line as received.
    pub text: String,
    /// First space-separated token, lowercased.
    pub command: String,
    /// Everything after the first space, if anything.
    pub args: Option<String>,
}

impl Reply {
    pub fn parse(text: &str) -> Reply {
        let trimmed = text.trim();
        let (head, rest) = match trimmed.split_once(' ') {
            Some((head, rest)) => (head, Some(rest.trim().to_string())),
            None => (trimmed, None),
        };
        Reply {
            text: text.to_string(),
            command: head.to_lowercase(),
            args: rest.filter(|r| !r.is_empty()),
        }
    }

    pub fn is(&self, command: &str) -> bool {
        self.command == command
    }
}

/// One line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    /// Out-of-band notice for display.
    Message(String),
    /// Answer to the outstanding request.
    Answer(Reply),
}

/// Split engine output into notices and answers.
pub fn classify(line: &str) -> EngineLine {
    let reply = Reply::parse(line);
    if reply.is(MESSAGE) {
        EngineLine::Message(reply.args.unwrap_or_default())
    } else {
        EngineLine::Answer(reply)
    }
}

/// Extract `key="value"` pairs from an `about` answer.
///
/// Pairs may be separated by commas and whitespace. Pairs with an empty key
/// or value are skipped.
pub fn parse_about(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = text;
    while let Some(eq) = rest.find('=') {
        let head = rest[..eq].trim_end();
        let key_start = head
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
            .last()
            .map_or(head.len(), |(i, _)| i);
        let key = &head[key_start..];
        let after = rest[eq + 1..].trim_start();
        let Some(quoted) = after.strip_prefix('"') else {
            rest = &rest[eq + 1..];
            continue;
        };
        let Some(end) = quoted.find('"') else { break };
        let value = &quoted[..end];
        if !key.is_empty() && !value.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
        rest = &quoted[end + 1..];
    }
    pairs
}

pub fn start_command(width: usize, height: usize) -> String {
    format!("start {width} {height}")
}

pub fn squareinfo_command(x: usize, y: usize) -> String {
    format!("squareinfo {x} {y}")
}

pub fn turn_command(x: usize, y: usize) -> String {
    format!("turn {x},{y}")
}

/// Multi-line history sync for a non-empty move list.
///
/// Each move is sent with the number of the side that actually played it.
/// The payload ends in `done` when a best move is wanted, `load` otherwise.
pub fn board_payload(moves: &MoveList, want_best_move: bool) -> Option<String> {
    if moves.is_empty() {
        return None;
    }
    let mut text = String::from(BOARD);
    text.push('\n');
    for m in moves {
        text.push_str(&board_entry(m));
        text.push('\n');
    }
    text.push_str(if want_best_move { DONE } else { LOAD });
    Some(text)
}

/// One `x,y,side` history line.
pub fn board_entry(m: &Move) -> String {
    format!("{},{},{}", m.x, m.y, m.side.id())
}

fn parse_number(token: &str, line: &str) -> Result<usize, ProtocolError> {
    token
        .trim()
        .parse()
        .map_err(|_| ProtocolError::Malformed(line.to_string()))
}

/// Parse an `x,y,side` history line.
pub fn parse_board_entry(line: &str) -> Result<Move, ProtocolError> {
    let parts: Vec<&str> = line.trim().split(',').collect();
    let [x, y, side] = parts.as_slice() else {
        return Err(ProtocolError::Malformed(line.to_string()));
    };
    let side = parse_number(side, line)?;
    let side = Side::from_id(u32::try_from(side).unwrap_or(u32::MAX))?;
    Ok(Move {
        x: parse_number(x, line)?,
        y: parse_number(y, line)?,
        side,
    })
}

/// Parse an `x,y` move answer.
pub fn parse_coord(text: &str) -> Result<(usize, usize), ProtocolError> {
    let Some((x, y)) = text.trim().split_once(',') else {
        return Err(ProtocolError::Malformed(text.to_string()));
    };
    Ok((parse_number(x, text)?, parse_number(y, text)?))
}

/// Parse the `x y x y ...` list carried by a `play` answer.
pub fn parse_play_moves(args: &str) -> Result<Vec<(usize, usize)>, ProtocolError> {
    let numbers = args
        .split_whitespace()
        .map(|t| parse_number(t, args))
        .collect::<Result<Vec<_>, _>>()?;
    if numbers.len() % 2 != 0 {
        return Err(ProtocolError::Malformed(args.to_string()));
    }
    Ok(numbers.chunks(2).map(|c| (c[0], c[1])).collect())
}

/// A command as seen by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    About,
    Start { width: usize, height: usize },
    Begin,
    Board,
    Turn { x: usize, y: usize },
    SinglePlay,
    SquareInfo { x: usize, y: usize },
    End,
    Unknown(String),
}

impl Request {
    pub fn parse(line: &str) -> Request {
        let reply = Reply::parse(line);
        let args: Vec<&str> = reply
            .args
            .as_deref()
            .map(|a| a.split_whitespace().collect())
            .unwrap_or_default();
        let numbers = || -> Option<(usize, usize)> {
            match args.as_slice() {
                [a, b] => Some((a.parse().ok()?, b.parse().ok()?)),
                _ => None,
            }
        };
        match reply.command.as_str() {
            ABOUT => Request::About,
            "start" => match numbers() {
                Some((width, height)) if width > 0 && height > 0 => {
                    Request::Start { width, height }
                }
                _ => Request::Unknown(line.to_string()),
            },
            BEGIN => Request::Begin,
            BOARD => Request::Board,
            "turn" => match args.as_slice() {
                [coord] => match parse_coord(coord) {
                    Ok((x, y)) => Request::Turn { x, y },
                    Err(_) => Request::Unknown(line.to_string()),
                },
                _ => Request::Unknown(line.to_string()),
            },
            SINGLE_PLAY => Request::SinglePlay,
            "squareinfo" => match numbers() {
                Some((x, y)) => Request::SquareInfo { x, y },
                None => Request::Unknown(line.to_string()),
            },
            END => Request::End,
            _ => Request::Unknown(line.to_string()),
        }
    }
}
