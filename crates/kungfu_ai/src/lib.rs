//! AI decision pipeline for the real-time chess engine.
//!
//! Once per tick per AI seat, the controller decides whether to act
//! (think delay) and, if so, runs the pipeline: extract an AI-friendly
//! snapshot, generate scored candidates under level-dependent caps,
//! build arrival-time fields for both sides, evaluate tactics, and emit
//! the best `(piece_id, to_row, to_col)`. Every emitted move goes back
//! through the engine's normal validation gate.
//!
//! ## Module Organization
//!
//! - `state` - Snapshot extraction (IDLE / TRAVELING / COOLDOWN views)
//! - `move_gen` - Candidate generation and categorisation
//! - `arrival` - Minimum arrival-time fields and post-arrival safety
//! - `tactics` - Dodge probability, recapture setups, threat analysis
//! - `eval` - Weighted scoring with level-dependent noise
//! - `controller` - `KungFuAi` (levels 1-3) and `DummyAi`

pub mod arrival;
pub mod controller;
pub mod eval;
pub mod move_gen;
pub mod state;
pub mod tactics;

pub use controller::{ai_for, DummyAi, KungFuAi};
pub use state::{AiPiece, AiState, PieceStatus, StateExtractor};

use kungfu_engine::types::PieceKind;

/// Material values used across the evaluation stack. The king's value is
/// nominal; king threats are capped elsewhere so they cannot dominate.
pub fn piece_value(kind: PieceKind) -> f64 {
    match kind {
        PieceKind::Pawn => 1.0,
        PieceKind::Knight | PieceKind::Bishop => 3.0,
        PieceKind::Rook => 5.0,
        PieceKind::Queen => 9.0,
        PieceKind::King => 100.0,
    }
}
