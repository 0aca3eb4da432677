//! Snapshot extraction.
//!
//! Converts a `GameState` into the read-model the rest of the pipeline
//! works on. The snapshot is taken between ticks and never holds
//! references into the live state. Enemy intent is deliberately hidden:
//! for an enemy piece in flight we expose only the unit direction of
//! travel, never the destination.

use std::collections::HashMap;

use kungfu_engine::collision::interpolated_position;
use kungfu_engine::engine::piece_candidates;
use kungfu_engine::moves::{Cooldown, Move};
use kungfu_engine::types::{PieceKind, PlayerNum, Tick};
use kungfu_engine::GameState;

/// What a piece can do right now, from the AI's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceStatus {
    /// Can act now.
    Idle,
    /// Has an active move.
    Traveling,
    /// Waiting out a cooldown.
    Cooldown,
}

/// AI-friendly view of one uncaptured piece.
#[derive(Debug, Clone)]
pub struct AiPiece {
    pub id: String,
    pub kind: PieceKind,
    pub player: PlayerNum,
    pub status: PieceStatus,
    /// Ticks remaining on cooldown, 0 otherwise.
    pub cooldown_remaining: Tick,
    /// Resting grid square (the travel origin while in flight).
    pub grid: (i32, i32),
    /// Interpolated position at the snapshot tick.
    pub current: (f64, f64),
    pub moved: bool,
    /// Destination square, populated for the AI's own traveling pieces.
    pub destination: Option<(i32, i32)>,
    /// Unit travel direction, populated for traveling enemy pieces.
    pub travel_direction: Option<(f64, f64)>,
}

/// Snapshot of the game at one tick, with the lookups the pipeline needs
/// precomputed.
#[derive(Debug, Clone)]
pub struct AiState {
    pub pieces: Vec<AiPiece>,
    pub ai_player: PlayerNum,
    pub current_tick: Tick,
    pub board_width: i32,
    pub board_height: i32,
    /// Escape squares per enemy piece id, for dodge analysis.
    pub enemy_escape_moves: HashMap<String, Vec<(i32, i32)>>,
    by_id: HashMap<String, usize>,
    movable: Vec<usize>,
    own: Vec<usize>,
    enemy: Vec<usize>,
    own_king: Option<usize>,
    enemy_king: Option<usize>,
}

impl AiState {
    pub fn piece(&self, piece_id: &str) -> Option<&AiPiece> {
        self.by_id.get(piece_id).map(|&i| &self.pieces[i])
    }

    /// Index of a piece in `pieces`, for candidate back-references.
    pub fn index_of(&self, piece_id: &str) -> Option<usize> {
        self.by_id.get(piece_id).copied()
    }

    /// Own pieces that can act right now.
    pub fn movable_pieces(&self) -> impl Iterator<Item = &AiPiece> {
        self.movable.iter().map(|&i| &self.pieces[i])
    }

    pub fn movable_count(&self) -> usize {
        self.movable.len()
    }

    pub fn own_pieces(&self) -> impl Iterator<Item = &AiPiece> {
        self.own.iter().map(|&i| &self.pieces[i])
    }

    pub fn enemy_pieces(&self) -> impl Iterator<Item = &AiPiece> {
        self.enemy.iter().map(|&i| &self.pieces[i])
    }

    pub fn own_king(&self) -> Option<&AiPiece> {
        self.own_king.map(|i| &self.pieces[i])
    }

    /// The nearest enemy king (there is only one in two-player games).
    pub fn enemy_king(&self) -> Option<&AiPiece> {
        self.enemy_king.map(|i| &self.pieces[i])
    }
}

/// Builds `AiState` snapshots.
pub struct StateExtractor;

impl StateExtractor {
    pub fn extract(state: &GameState, ai_player: PlayerNum) -> AiState {
        let tps = state.config().ticks_per_square;
        let move_by_piece: HashMap<&str, &Move> = state
            .active_moves
            .iter()
            .map(|m| (m.piece_id.as_str(), m))
            .collect();
        let cooldown_by_piece: HashMap<&str, &Cooldown> = state
            .cooldowns
            .iter()
            .filter(|c| c.is_active(state.current_tick))
            .map(|c| (c.piece_id.as_str(), c))
            .collect();

        let mut pieces = Vec::new();
        let mut by_id = HashMap::new();
        let mut movable = Vec::new();
        let mut own = Vec::new();
        let mut enemy = Vec::new();
        let mut own_king = None;
        let mut enemy_kings: Vec<usize> = Vec::new();
        let mut enemy_escape_moves = HashMap::new();

        for piece in state.board.pieces() {
            if piece.captured {
                continue;
            }

            let mv = move_by_piece.get(piece.id.as_str()).copied();
            let cd = cooldown_by_piece.get(piece.id.as_str()).copied();

            let status = if mv.is_some() {
                PieceStatus::Traveling
            } else if cd.is_some() {
                PieceStatus::Cooldown
            } else {
                PieceStatus::Idle
            };

            let cooldown_remaining = cd
                .map(|c| c.remaining(state.current_tick))
                .unwrap_or(0);

            let mut destination = None;
            let mut travel_direction = None;
            if let Some(mv) = mv {
                if piece.player == ai_player {
                    destination = Some(mv.destination());
                } else {
                    let (start_row, start_col) = mv.start_position();
                    let (end_row, end_col) = mv.end_position();
                    let dr = end_row - start_row;
                    let dc = end_col - start_col;
                    let length = dr.abs().max(dc.abs());
                    if length > 0.0 {
                        travel_direction = Some((dr / length, dc / length));
                    }
                }
            } else if piece.player != ai_player {
                // Idle or cooling enemy: remember where it could run to.
                enemy_escape_moves.insert(
                    piece.id.clone(),
                    piece_candidates(piece, &state.board, &state.active_moves),
                );
            }

            let index = pieces.len();
            pieces.push(AiPiece {
                id: piece.id.clone(),
                kind: piece.kind,
                player: piece.player,
                status,
                cooldown_remaining,
                grid: piece.grid_position(),
                current: interpolated_position(piece, mv, state.current_tick, tps),
                moved: piece.moved,
                destination,
                travel_direction,
            });
            by_id.insert(piece.id.clone(), index);

            if piece.player == ai_player {
                own.push(index);
                if status == PieceStatus::Idle {
                    movable.push(index);
                }
                if piece.kind == PieceKind::King {
                    own_king = Some(index);
                }
            } else {
                enemy.push(index);
                if piece.kind == PieceKind::King {
                    enemy_kings.push(index);
                }
            }
        }

        // Nearest enemy king to our own, for threat targeting in 4P.
        let enemy_king = match own_king {
            Some(own_idx) => {
                let own_grid = pieces[own_idx].grid;
                enemy_kings.into_iter().min_by_key(|&i| {
                    let (r, c) = pieces[i].grid;
                    (r - own_grid.0).abs().max((c - own_grid.1).abs())
                })
            }
            None => enemy_kings.into_iter().next(),
        };

        AiState {
            pieces,
            ai_player,
            current_tick: state.current_tick,
            board_width: state.board.width,
            board_height: state.board.height,
            enemy_escape_moves,
            by_id,
            movable,
            own,
            enemy,
            own_king,
            enemy_king,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use kungfu_engine::engine::{apply_move, create_game, set_player_ready, tick, validate_move};
    use kungfu_engine::types::{BoardKind, Speed};

    fn started() -> GameState {
        let players: BTreeMap<PlayerNum, String> =
            BTreeMap::from([(1, "bot:one".to_string()), (2, "bot:two".to_string())]);
        let mut state =
            create_game(Speed::Standard, players, BoardKind::Standard, None).unwrap();
        set_player_ready(&mut state, 1);
        state
    }

    #[test]
    fn initial_snapshot_is_all_idle() {
        let state = started();
        let ai = StateExtractor::extract(&state, 1);
        assert_eq!(ai.pieces.len(), 32);
        assert_eq!(ai.movable_count(), 16);
        assert!(ai
            .pieces
            .iter()
            .all(|p| p.status == PieceStatus::Idle && p.cooldown_remaining == 0));
        assert_eq!(ai.own_king().map(|k| k.grid), Some((7, 4)));
        assert_eq!(ai.enemy_king().map(|k| k.grid), Some((0, 4)));
    }

    #[test]
    fn traveling_own_piece_exposes_destination() {
        let mut state = started();
        let mv = validate_move(&state, 1, "P:1:6:4", 4, 4).unwrap();
        apply_move(&mut state, mv);
        tick(&mut state);

        let ai = StateExtractor::extract(&state, 1);
        let pawn = ai.piece("P:1:6:4").unwrap();
        assert_eq!(pawn.status, PieceStatus::Traveling);
        assert_eq!(pawn.destination, Some((4, 4)));
        assert!(pawn.travel_direction.is_none());
    }

    #[test]
    fn traveling_enemy_piece_hides_destination() {
        let mut state = started();
        let mv = validate_move(&state, 1, "P:1:6:4", 4, 4).unwrap();
        apply_move(&mut state, mv);
        tick(&mut state);

        let ai = StateExtractor::extract(&state, 2);
        let pawn = ai.piece("P:1:6:4").unwrap();
        assert_eq!(pawn.status, PieceStatus::Traveling);
        assert!(pawn.destination.is_none());
        // Player 1 pawns run toward row 0: unit direction (-1, 0).
        assert_eq!(pawn.travel_direction, Some((-1.0, 0.0)));
    }

    #[test]
    fn cooldown_status_and_remaining() {
        let mut state = started();
        let mv = validate_move(&state, 1, "P:1:6:4", 5, 4).unwrap();
        apply_move(&mut state, mv);
        let tps = state.config().ticks_per_square;
        for _ in 0..(tps + 1) {
            tick(&mut state);
        }

        let ai = StateExtractor::extract(&state, 1);
        let pawn = ai.piece("P:1:6:4").unwrap();
        assert_eq!(pawn.status, PieceStatus::Cooldown);
        assert!(pawn.cooldown_remaining > 0);
        assert!(!ai.movable_pieces().any(|p| p.id == "P:1:6:4"));
    }

    #[test]
    fn idle_enemies_have_escape_tables() {
        let state = started();
        let ai = StateExtractor::extract(&state, 1);
        // Every enemy piece is idle, so every one has an entry; pawns and
        // knights actually have somewhere to go.
        assert_eq!(ai.enemy_escape_moves.len(), 16);
        assert!(!ai.enemy_escape_moves["P:2:1:4"].is_empty());
        assert!(!ai.enemy_escape_moves["N:2:0:1"].is_empty());
    }
}
