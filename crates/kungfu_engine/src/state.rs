//! Game state and speed profiles.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::moves::{Cooldown, Move};
use crate::types::{BoardKind, GameStatus, PlayerNum, Speed, Tick, WinReason};

/// Tick-denominated constants selected at game creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedConfig {
    /// Ticks for a piece to traverse one path segment.
    pub ticks_per_square: Tick,
    /// Cooldown duration after a completed move.
    pub cooldown_ticks: Tick,
    /// No inactivity draw before this many ticks have elapsed.
    pub min_draw_ticks: Tick,
    /// Ticks without any move initiation before a draw is considered.
    pub draw_no_move_ticks: Tick,
    /// Ticks without any capture before a draw is considered.
    pub draw_no_capture_ticks: Tick,
}

/// One move initiation, recorded for post-game reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayMove {
    pub tick: Tick,
    pub piece_id: String,
    pub to_row: i32,
    pub to_col: i32,
    pub player: PlayerNum,
}

/// The complete mutable state of one game.
///
/// Owned by exactly one executor; external observers read value-copied
/// snapshots or derived views between ticks.
#[derive(Debug, Clone)]
pub struct GameState {
    pub game_id: String,
    pub board: Board,
    pub speed: Speed,
    /// Seat number to opaque player id (`u:…`, `guest:…`, `bot:…`). The
    /// engine only compares these for equality.
    pub players: BTreeMap<PlayerNum, String>,
    pub ready_players: BTreeSet<PlayerNum>,
    pub status: GameStatus,
    pub current_tick: Tick,
    pub active_moves: Vec<Move>,
    pub cooldowns: Vec<Cooldown>,
    pub replay_moves: Vec<ReplayMove>,
    pub last_move_tick: Tick,
    pub last_capture_tick: Tick,
    /// 0 = draw, 1-4 = winning seat. `None` while the game is running.
    pub winner: Option<PlayerNum>,
    pub win_reason: Option<WinReason>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Setup string for games that did not begin from the stock layout.
    pub initial_board: Option<String>,
}

impl GameState {
    pub fn new(
        game_id: String,
        board: Board,
        speed: Speed,
        players: BTreeMap<PlayerNum, String>,
    ) -> Self {
        GameState {
            game_id,
            board,
            speed,
            players,
            ready_players: BTreeSet::new(),
            status: GameStatus::Waiting,
            current_tick: 0,
            active_moves: Vec::new(),
            cooldowns: Vec::new(),
            replay_moves: Vec::new(),
            last_move_tick: 0,
            last_capture_tick: 0,
            winner: None,
            win_reason: None,
            started_at: None,
            finished_at: None,
            initial_board: None,
        }
    }

    pub fn config(&self) -> &'static SpeedConfig {
        self.speed.config()
    }

    pub fn board_kind(&self) -> BoardKind {
        self.board.kind
    }
}
