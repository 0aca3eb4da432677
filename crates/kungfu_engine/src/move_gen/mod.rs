//! Move geometry and path validation.
//!
//! For a piece and a destination square this module produces the ordered
//! list of traversed waypoints, or nothing if the move is not legal.
//! Clearance is checked against the *current in-flight move set*: a moving
//! piece has vacated its start square, and the squares it has yet to reach
//! (its forward path) block its own side.
//!
//! ## Module Organization
//!
//! - `pawn` - Forward pushes, diagonal captures, promotion test
//! - `knight` - L-shaped jumps with a fractional midpoint
//! - `sliding` - Bishops, rooks, queens
//! - `king` - Single-step moves
//! - `castling` - King + rook pair moves, 2P and both 4P axes
//! - `orientation` - Per-seat movement frames for the 4P board

mod castling;
mod king;
pub mod knight;
pub mod orientation;
mod pawn;
pub mod sliding;

pub use castling::check_castling;
pub use knight::knight_path;
pub use pawn::should_promote_pawn;

use crate::board::{Board, Piece};
use crate::moves::{Move, Path};
use crate::state::SpeedConfig;
use crate::types::{PieceKind, Tick};

/// Compute the path for a piece to reach `(to_row, to_col)`, or `None` if
/// the move is geometrically impossible or blocked. The path includes the
/// starting position as its first element.
pub fn compute_move_path(
    piece: &Piece,
    board: &Board,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
    current_tick: Tick,
    config: &SpeedConfig,
) -> Option<Path> {
    let (from_row, from_col) = piece.grid_position();

    if (from_row, from_col) == (to_row, to_col) {
        return None;
    }
    if !board.is_valid_square(to_row, to_col) {
        return None;
    }

    let path = match piece.kind {
        PieceKind::Pawn => pawn::pawn_path(piece, board, to_row, to_col, active_moves)?,
        PieceKind::Knight => knight::knight_path(from_row, from_col, to_row, to_col)?,
        PieceKind::Bishop => sliding::bishop_path(from_row, from_col, to_row, to_col)?,
        PieceKind::Rook => sliding::rook_path(from_row, from_col, to_row, to_col)?,
        PieceKind::Queen => sliding::queen_path(from_row, from_col, to_row, to_col)?,
        PieceKind::King => king::king_path(from_row, from_col, to_row, to_col)?,
    };

    let clear = if piece.kind == PieceKind::Knight {
        // Knights jump over blockers; only the landing square matters.
        knight_destination_ok(&path, board, piece.player, active_moves, current_tick, config)
    } else {
        is_path_clear(&path, board, piece.player, active_moves, current_tick, config)
    };

    clear.then_some(path)
}

/// Integer waypoints of an in-flight move that the piece has not yet
/// reached. These squares block the owner's other pieces. Fractional
/// knight midpoints are skipped: a jumping knight never blocks.
pub fn forward_path(mv: &Move, current_tick: Tick, ticks_per_square: Tick) -> Vec<(i32, i32)> {
    if mv.path.len() < 2 {
        return Vec::new();
    }

    let elapsed = current_tick - mv.start_tick;
    let first_pending = if elapsed < 0 {
        // Not started: everything after the start square is still ahead.
        1
    } else {
        let total_ticks = mv.total_ticks(ticks_per_square);
        if elapsed >= total_ticks {
            return Vec::new();
        }
        (elapsed / ticks_per_square) as usize + 1
    };

    mv.path[first_pending..]
        .iter()
        .filter(|(r, c)| r.fract() == 0.0 && c.fract() == 0.0)
        .map(|&(r, c)| (r as i32, c as i32))
        .collect()
}

/// Forward-path squares of every in-flight move owned by `player`.
fn own_forward_squares(
    board: &Board,
    player: u8,
    active_moves: &[Move],
    current_tick: Tick,
    ticks_per_square: Tick,
) -> Vec<(i32, i32)> {
    let mut squares = Vec::new();
    for mv in active_moves {
        let Some(mover) = board.piece(&mv.piece_id) else {
            continue;
        };
        if mover.player == player {
            squares.extend(forward_path(mv, current_tick, ticks_per_square));
        }
    }
    squares
}

/// Clearance rules for a computed path:
/// intermediate squares are blocked by stationary pieces and by own
/// forward paths (moving pieces have vacated); the destination is blocked
/// by stationary own pieces and own forward paths, while stationary
/// enemies there are capture-on-arrival business for the collision
/// resolver.
fn is_path_clear(
    path: &Path,
    board: &Board,
    player: u8,
    active_moves: &[Move],
    current_tick: Tick,
    config: &SpeedConfig,
) -> bool {
    let own_forward =
        own_forward_squares(board, player, active_moves, current_tick, config.ticks_per_square);

    for &(row, col) in &path[1..path.len() - 1] {
        let (row, col) = (row as i32, col as i32);

        if let Some(occupant) = board.piece_at(row, col) {
            if !crate::moves::is_piece_moving(&occupant.id, active_moves) {
                return false;
            }
        }
        if own_forward.contains(&(row, col)) {
            return false;
        }
    }

    let (dest_row, dest_col) = {
        let (r, c) = path[path.len() - 1];
        (r as i32, c as i32)
    };
    if let Some(occupant) = board.piece_at(dest_row, dest_col) {
        let moving = crate::moves::is_piece_moving(&occupant.id, active_moves);
        if !moving && occupant.player == player {
            return false;
        }
    }
    if own_forward.contains(&(dest_row, dest_col)) {
        return false;
    }

    true
}

/// Landing rules for knights: blocked only by a stationary own piece on
/// the destination or by an own in-flight move's forward path.
fn knight_destination_ok(
    path: &Path,
    board: &Board,
    player: u8,
    active_moves: &[Move],
    current_tick: Tick,
    config: &SpeedConfig,
) -> bool {
    let (dest_row, dest_col) = {
        let (r, c) = path[path.len() - 1];
        (r as i32, c as i32)
    };

    if let Some(occupant) = board.piece_at(dest_row, dest_col) {
        let moving = crate::moves::is_piece_moving(&occupant.id, active_moves);
        if !moving && occupant.player == player {
            return false;
        }
    }

    let own_forward =
        own_forward_squares(board, player, active_moves, current_tick, config.ticks_per_square);
    !own_forward.contains(&(dest_row, dest_col))
}
