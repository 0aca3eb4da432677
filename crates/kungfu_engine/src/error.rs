//! Error types for the engine.
//!
//! Validation failures are values, never panics: the caller decides what to
//! report. Each `MoveError` variant carries a stable kind tag that the
//! transport layer can forward to clients verbatim.

use thiserror::Error;

/// Why a proposed move was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("game not found")]
    GameNotFound,

    #[error("invalid player key")]
    InvalidKey,

    #[error("game is already over")]
    GameOver,

    #[error("game has not started yet")]
    GameNotStarted,

    #[error("piece not found")]
    PieceNotFound,

    #[error("this piece belongs to another player")]
    NotYourPiece,

    #[error("this piece has been captured")]
    PieceCaptured,

    #[error("invalid move")]
    InvalidMove,
}

impl MoveError {
    /// Stable wire tag for this rejection.
    pub fn kind(&self) -> &'static str {
        match self {
            MoveError::GameNotFound => "game_not_found",
            MoveError::InvalidKey => "invalid_key",
            MoveError::GameOver => "game_over",
            MoveError::GameNotStarted => "game_not_started",
            MoveError::PieceNotFound => "piece_not_found",
            MoveError::NotYourPiece => "not_your_piece",
            MoveError::PieceCaptured => "piece_captured",
            MoveError::InvalidMove => "invalid_move",
        }
    }
}

/// Errors from parsing a board setup string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("expected {expected} rows, got {got}")]
    RowCount { expected: usize, got: usize },

    #[error("row {row} has wrong length: {got}, expected {expected}")]
    RowLength {
        row: usize,
        got: usize,
        expected: usize,
    },

    #[error("unknown piece type: {0}")]
    UnknownPieceType(char),

    #[error("invalid player number: {0}")]
    InvalidPlayer(char),

    #[error("piece placed on invalid square ({row}, {col})")]
    InvalidSquare { row: i32, col: i32 },
}

/// Errors from constructing a game.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameSetupError {
    #[error("standard board requires exactly 2 players, got {0}")]
    StandardPlayerCount(usize),

    #[error("four-player board requires 2-4 players, got {0}")]
    FourPlayerCount(usize),
}

/// Errors from re-simulating a replay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("bad setup string: {0}")]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Game(#[from] GameSetupError),
}
