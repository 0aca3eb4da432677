//! Core engine types: piece kinds, players, board variants, speed profiles.

use serde::{Deserialize, Serialize};

use crate::constants::TICK_RATE_HZ;
use crate::state::SpeedConfig;

/// Game time in ticks. Signed so that `current_tick - start_tick` is well
/// defined for moves scheduled on a future tick.
pub type Tick = i64;

/// Player seat number, 1-4. Player ids (the opaque strings handed in by the
/// identity layer) are mapped to seats in `GameState::players`.
pub type PlayerNum = u8;

/// The six chess piece types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// One-letter code used in piece ids and board setup strings.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// Board layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardKind {
    /// 8x8, two players.
    Standard,
    /// 12x12 with 2x2 corners cut out, up to four players.
    FourPlayer,
}

/// Game lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

/// Why a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    KingCaptured,
    Draw,
    Resignation,
    /// Reserved for four-player games decided by elimination outside the
    /// king-capture path.
    LastStanding,
    /// Administrative termination; not rating-eligible.
    Invalid,
}

impl WinReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WinReason::KingCaptured => "king_captured",
            WinReason::Draw => "draw",
            WinReason::Resignation => "resignation",
            WinReason::LastStanding => "last_standing",
            WinReason::Invalid => "invalid",
        }
    }
}

/// Game speed profile selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speed {
    Standard,
    Lightning,
}

const STANDARD_CONFIG: SpeedConfig = SpeedConfig {
    ticks_per_square: 30,
    cooldown_ticks: 300,
    min_draw_ticks: 60 * TICK_RATE_HZ,
    draw_no_move_ticks: 30 * TICK_RATE_HZ,
    draw_no_capture_ticks: 60 * TICK_RATE_HZ,
};

// Lightning is 5x faster per square and per cooldown; the inactivity-draw
// thresholds stay the same wall time in both profiles.
const LIGHTNING_CONFIG: SpeedConfig = SpeedConfig {
    ticks_per_square: 6,
    cooldown_ticks: 60,
    min_draw_ticks: 60 * TICK_RATE_HZ,
    draw_no_move_ticks: 30 * TICK_RATE_HZ,
    draw_no_capture_ticks: 60 * TICK_RATE_HZ,
};

impl Speed {
    pub fn config(self) -> &'static SpeedConfig {
        match self {
            Speed::Standard => &STANDARD_CONFIG,
            Speed::Lightning => &LIGHTNING_CONFIG,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Speed::Standard => "standard",
            Speed::Lightning => "lightning",
        }
    }
}
