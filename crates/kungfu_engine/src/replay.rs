//! Finished-game records.
//!
//! A replay stores only move initiations; the simulator is deterministic,
//! so feeding them back through the normal validation gate at the recorded
//! ticks reproduces the winner, the win reason, and the final board.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine;
use crate::error::ReplayError;
use crate::setup::parse_board_string;
use crate::state::GameState;
pub use crate::state::ReplayMove;
use crate::types::{BoardKind, GameStatus, PlayerNum, Speed, Tick, WinReason};

/// Everything needed to reconstruct a finished game. The storage layer
/// persists this; the engine never retries failed writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub game_id: String,
    pub speed: Speed,
    pub board_kind: BoardKind,
    pub players: BTreeMap<PlayerNum, String>,
    pub moves: Vec<ReplayMove>,
    pub total_ticks: Tick,
    /// 0 = draw, 1-4 = winning seat.
    pub winner: PlayerNum,
    pub win_reason: WinReason,
    pub created_at: DateTime<Utc>,
    /// Setup string for games that did not start from the stock layout.
    pub initial_board: Option<String>,
}

impl Replay {
    /// Capture a finished game. Returns `None` while the game is running.
    pub fn from_game_state(state: &GameState) -> Option<Replay> {
        if state.status != GameStatus::Finished {
            return None;
        }
        Some(Replay {
            game_id: state.game_id.clone(),
            speed: state.speed,
            board_kind: state.board.kind,
            players: state.players.clone(),
            moves: state.replay_moves.clone(),
            total_ticks: state.current_tick,
            winner: state.winner.unwrap_or(0),
            win_reason: state.win_reason.unwrap_or(WinReason::Draw),
            created_at: state.finished_at.unwrap_or_else(Utc::now),
            initial_board: state.initial_board.clone(),
        })
    }

    /// Re-simulate this replay from the start. The result carries the
    /// reconstructed final state.
    pub fn resimulate(&self) -> Result<GameState, ReplayError> {
        let mut state = match &self.initial_board {
            Some(setup) => {
                let board = parse_board_string(setup, self.board_kind)?;
                engine::create_game_from_board(
                    self.speed,
                    self.players.clone(),
                    board,
                    Some(self.game_id.clone()),
                )
            }
            None => engine::create_game(
                self.speed,
                self.players.clone(),
                self.board_kind,
                Some(self.game_id.clone()),
            )?,
        };

        let seats: Vec<PlayerNum> = state.players.keys().copied().collect();
        for seat in seats {
            engine::set_player_ready(&mut state, seat);
        }

        let mut next = 0usize;
        while state.status == GameStatus::Playing && state.current_tick < self.total_ticks {
            while next < self.moves.len() && self.moves[next].tick == state.current_tick {
                let record = &self.moves[next];
                next += 1;
                // Castling rook entries are recorded too, but re-validation
                // of the king's move re-creates them; skip anything that no
                // longer validates rather than desynchronising the clock.
                match engine::validate_move(
                    &state,
                    record.player,
                    &record.piece_id,
                    record.to_row,
                    record.to_col,
                ) {
                    Ok(mv) => {
                        engine::apply_move(&mut state, mv);
                    }
                    Err(err) => {
                        warn!(
                            game_id = %self.game_id,
                            piece = %record.piece_id,
                            %err,
                            "replayed move no longer validates"
                        );
                    }
                }
            }
            engine::tick(&mut state);
        }

        Ok(state)
    }
}
