//! Candidate move generation.
//!
//! Draws from the engine's legal-move enumeration, then narrows to a
//! level-dependent budget: a handful of randomly chosen pieces, a few
//! candidates each, captures and king threats first. Randomised piece
//! selection keeps play from becoming predictable.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use kungfu_engine::engine::legal_moves;
use kungfu_engine::types::{PieceKind, PlayerNum, Tick};
use kungfu_engine::GameState;

use crate::state::{AiState, PieceStatus};

/// Category of a candidate move, used for prioritisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MoveCategory {
    Capture,
    KingThreat,
    Positional,
}

/// A candidate move plus the metadata scoring needs.
#[derive(Debug, Clone)]
pub struct CandidateMove {
    pub piece_id: String,
    pub to_row: i32,
    pub to_col: i32,
    pub category: MoveCategory,
    /// Kind of the enemy piece on the destination, for captures.
    pub capture_kind: Option<PieceKind>,
    /// Index of the moving piece in the snapshot's piece list.
    pub piece: usize,
}

/// Ticks for a piece to travel between two squares: knights always take
/// two segments, everything else one segment per square of Chebyshev
/// distance.
pub fn travel_ticks(from: (i32, i32), to: (i32, i32), kind: PieceKind, tps: Tick) -> Tick {
    if kind == PieceKind::Knight {
        return 2 * tps;
    }
    let dist = (to.0 - from.0).abs().max((to.1 - from.1).abs()) as Tick;
    dist * tps
}

/// Generate candidates for the AI seat, bounded by `max_pieces` pieces
/// and `max_per_piece` candidates per piece.
pub fn generate_candidates(
    state: &GameState,
    ai: &AiState,
    player: PlayerNum,
    max_pieces: usize,
    max_per_piece: usize,
    rng: &mut impl Rng,
) -> Vec<CandidateMove> {
    if ai.movable_count() == 0 {
        return Vec::new();
    }

    let enemy_king_pos = ai.enemy_king().map(|k| k.grid);

    // Stationary enemies by square, for capture classification.
    let enemy_positions: HashMap<(i32, i32), PieceKind> = ai
        .enemy_pieces()
        .filter(|p| p.status != PieceStatus::Traveling)
        .map(|p| (p.grid, p.kind))
        .collect();

    let mut moves_by_piece: HashMap<String, Vec<(i32, i32)>> = HashMap::new();
    for (piece_id, to_row, to_col) in legal_moves(state, player) {
        moves_by_piece
            .entry(piece_id)
            .or_default()
            .push((to_row, to_col));
    }

    let mut shuffled: Vec<&str> = ai.movable_pieces().map(|p| p.id.as_str()).collect();
    shuffled.shuffle(rng);

    let mut candidates = Vec::new();
    let mut pieces_used = 0;

    for piece_id in shuffled {
        if pieces_used >= max_pieces && !candidates.is_empty() {
            break;
        }
        let Some(targets) = moves_by_piece.get(piece_id) else {
            continue;
        };
        let Some(piece_index) = ai.index_of(piece_id) else {
            continue;
        };
        pieces_used += 1;

        let mut piece_candidates: Vec<CandidateMove> = targets
            .iter()
            .map(|&(to_row, to_col)| {
                let dest = (to_row, to_col);
                let (category, capture_kind) = if let Some(&kind) = enemy_positions.get(&dest) {
                    (MoveCategory::Capture, Some(kind))
                } else if enemy_king_pos.is_some_and(|kp| is_king_threat(dest, kp)) {
                    (MoveCategory::KingThreat, None)
                } else {
                    (MoveCategory::Positional, None)
                };
                CandidateMove {
                    piece_id: piece_id.to_string(),
                    to_row,
                    to_col,
                    category,
                    capture_kind,
                    piece: piece_index,
                }
            })
            .collect();

        piece_candidates.sort_by_key(|c| c.category);
        candidates.extend(piece_candidates.into_iter().take(max_per_piece));
    }

    candidates
}

/// Within two squares of the enemy king.
fn is_king_threat(dest: (i32, i32), king_pos: (i32, i32)) -> bool {
    (dest.0 - king_pos.0).abs() <= 2 && (dest.1 - king_pos.1).abs() <= 2
}
