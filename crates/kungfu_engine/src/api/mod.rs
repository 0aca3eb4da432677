//! Public service boundary.
//!
//! The transport layer (HTTP, WebSocket, whatever the host uses) talks to
//! `GameService`; nothing outside this module hands out references into a
//! live `GameState`. Observers get value-copied snapshots or derived
//! views, and every request is serialised against the tick loop by the
//! per-game lock.
//!
//! ## Module Organization
//!
//! - `registry` - Ownership of all managed games, id lookup, idle reaping
//! - `service` - Game lifecycle, move intake, tick driving, draw/resign

mod registry;
mod service;

pub use registry::GameRegistry;
pub use service::{AcceptedMove, GameService, ManagedGame, PieceView};

use crate::state::GameState;
use crate::types::PlayerNum;

/// A computer player. Implementations decide *when* to act
/// (`should_move`, typically gated on an internal think delay) and *what*
/// to do (`get_move`). Returned moves flow through the same validation
/// gate as human moves; an AI cannot do anything a client could not.
pub trait AiPlayer: Send {
    /// Whether the AI wants to act on this tick.
    fn should_move(&mut self, state: &GameState, player: PlayerNum) -> bool;

    /// The chosen `(piece_id, to_row, to_col)`, or `None` to pass.
    fn get_move(&mut self, state: &GameState, player: PlayerNum) -> Option<(String, i32, i32)>;
}
