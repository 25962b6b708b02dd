//! Constants for board geometry, win detection, and match slots.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board width for a fresh match slot.
pub const DEFAULT_WIDTH: usize = 16;

/// Default board height for a fresh match slot.
pub const DEFAULT_HEIGHT: usize = 16;

/// Largest side length the built-in engine accepts in `start`.
pub const MAX_BOARD_SIDE: usize = 128;

// =============================================================================
// Win Detection
// =============================================================================

/// Stones in a row needed to win.
pub const WIN_LENGTH: usize = 5;

/// How far [`crate::board::Board::trace`] walks in each direction.
///
/// A trace sum of `TRACE_DEPTH` plus the placed stone itself makes `WIN_LENGTH`.
pub const TRACE_DEPTH: usize = WIN_LENGTH - 1;

/// The four axes checked for a line: horizontal, diagonal, vertical, anti-diagonal.
pub const AXES: [(isize, isize); 4] = [(1, 0), (1, 1), (0, 1), (-1, 1)];

// =============================================================================
// Match Slots
// =============================================================================

/// Number of independent match slots (each with its own game and engine).
pub const SLOT_COUNT: usize = 2;

/// File name prefix for per-slot local copies of engine executables.
pub const LOCAL_COPY_PREFIX: &str = "engine";
