//! Castling validation.
//!
//! The king moves exactly two squares toward a compatible rook; the rook's
//! move is attached to the king's as its `extra_move`. The rook path is
//! built with every intermediate square, so it traverses on the same
//! per-segment clock as the king (kingside arrivals coincide). This is
//! observable behaviour: the rook occupies each square at fixed times and
//! its forward path blocks friendly traffic.

use tracing::debug;

use crate::board::{Board, Piece};
use crate::move_gen::orientation::{orientation, Axis};
use crate::moves::{is_piece_moving, is_piece_on_cooldown, Cooldown, Move, Path};
use crate::types::{PieceKind, Tick};

/// Validate a castling attempt. Returns the king move (rook move attached)
/// if `(to_row, to_col)` is a castling destination for this king.
pub fn check_castling(
    piece: &Piece,
    board: &Board,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
    cooldowns: &[Cooldown],
    current_tick: Tick,
) -> Option<Move> {
    if piece.kind != PieceKind::King || piece.moved {
        return None;
    }

    match board.kind {
        crate::types::BoardKind::Standard => {
            check_castling_horizontal(piece, board, to_row, to_col, active_moves, cooldowns, current_tick, 7, 0)
        }
        crate::types::BoardKind::FourPlayer => {
            let orient = orientation(piece.player)?;
            match orient.axis {
                // Players whose pawns run along rows castle horizontally,
                // the others vertically; rooks sit at indices 2 and 9.
                Axis::Row => check_castling_horizontal(
                    piece, board, to_row, to_col, active_moves, cooldowns, current_tick, 9, 2,
                ),
                Axis::Col => check_castling_vertical(
                    piece, board, to_row, to_col, active_moves, cooldowns, current_tick,
                ),
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_castling_horizontal(
    king: &Piece,
    board: &Board,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
    cooldowns: &[Cooldown],
    current_tick: Tick,
    high_rook_col: i32,
    low_rook_col: i32,
) -> Option<Move> {
    let (from_row, from_col) = king.grid_position();

    if to_row != from_row {
        return None;
    }
    let col_diff = to_col - from_col;
    if col_diff.abs() != 2 {
        return None;
    }

    let (rook_col, new_rook_col) = if col_diff > 0 {
        (high_rook_col, to_col - 1)
    } else {
        (low_rook_col, to_col + 1)
    };

    let rook = find_rook(board, from_row, rook_col, king, active_moves, cooldowns, current_tick)?;

    if !span_is_clear(
        board,
        active_moves,
        |i| (from_row, i),
        from_col.min(rook_col) + 1,
        from_col.max(rook_col),
    ) {
        return None;
    }

    let king_path = stepped_path(from_row, from_col, 0, col_diff.signum(), 2);
    let rook_path = stepped_path(
        from_row,
        rook_col,
        0,
        (new_rook_col - rook_col).signum(),
        (new_rook_col - rook_col).abs(),
    );

    Some(pair(king, rook, king_path, rook_path))
}

fn check_castling_vertical(
    king: &Piece,
    board: &Board,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
    cooldowns: &[Cooldown],
    current_tick: Tick,
) -> Option<Move> {
    let (from_row, from_col) = king.grid_position();

    if to_col != from_col {
        return None;
    }
    let row_diff = to_row - from_row;
    if row_diff.abs() != 2 {
        return None;
    }

    let (rook_row, new_rook_row) = if row_diff > 0 {
        (9, to_row - 1)
    } else {
        (2, to_row + 1)
    };

    let rook = {
        let candidate = board.piece_at(rook_row, from_col);
        validate_rook(candidate, king, active_moves, cooldowns, current_tick)?
    };

    if !span_is_clear(
        board,
        active_moves,
        |i| (i, from_col),
        from_row.min(rook_row) + 1,
        from_row.max(rook_row),
    ) {
        return None;
    }

    let king_path = stepped_path(from_row, from_col, row_diff.signum(), 0, 2);
    let rook_path = stepped_path(
        rook_row,
        from_col,
        (new_rook_row - rook_row).signum(),
        0,
        (new_rook_row - rook_row).abs(),
    );

    Some(pair(king, rook, king_path, rook_path))
}

fn find_rook<'a>(
    board: &'a Board,
    row: i32,
    col: i32,
    king: &Piece,
    active_moves: &[Move],
    cooldowns: &[Cooldown],
    current_tick: Tick,
) -> Option<&'a Piece> {
    validate_rook(board.piece_at(row, col), king, active_moves, cooldowns, current_tick)
}

fn validate_rook<'a>(
    candidate: Option<&'a Piece>,
    king: &Piece,
    active_moves: &[Move],
    cooldowns: &[Cooldown],
    current_tick: Tick,
) -> Option<&'a Piece> {
    let rook = candidate?;
    if rook.kind != PieceKind::Rook || rook.player != king.player {
        debug!(king = %king.id, "castling rejected: no compatible rook");
        return None;
    }
    if rook.moved {
        debug!(rook = %rook.id, "castling rejected: rook has moved");
        return None;
    }
    if is_piece_moving(&rook.id, active_moves) {
        debug!(rook = %rook.id, "castling rejected: rook is in flight");
        return None;
    }
    if is_piece_on_cooldown(&rook.id, cooldowns, current_tick) {
        debug!(rook = %rook.id, "castling rejected: rook is on cooldown");
        return None;
    }
    Some(rook)
}

/// The span strictly between king and rook origins must be free of
/// stationary blockers (in-flight pieces have vacated), and no in-flight
/// move may terminate inside it.
fn span_is_clear(
    board: &Board,
    active_moves: &[Move],
    square: impl Fn(i32) -> (i32, i32),
    lo: i32,
    hi: i32,
) -> bool {
    for i in lo..hi {
        let (row, col) = square(i);
        if let Some(blocker) = board.piece_at(row, col) {
            if !is_piece_moving(&blocker.id, active_moves) {
                debug!(piece = %blocker.id, "castling rejected: path blocked");
                return false;
            }
        }
    }

    for mv in active_moves {
        let (end_row, end_col) = mv.destination();
        for i in lo..hi {
            if square(i) == (end_row, end_col) {
                debug!(piece = %mv.piece_id, "castling rejected: move lands in path");
                return false;
            }
        }
    }

    true
}

fn stepped_path(row: i32, col: i32, row_step: i32, col_step: i32, len: i32) -> Path {
    let mut path = Path::new();
    path.push((row as f64, col as f64));
    let (mut r, mut c) = (row, col);
    for _ in 0..len {
        r += row_step;
        c += col_step;
        path.push((r as f64, c as f64));
    }
    path
}

fn pair(king: &Piece, rook: &Piece, king_path: Path, rook_path: Path) -> Move {
    // start_tick is stamped by the validator entry point; both moves share it.
    let mut king_move = Move::new(king.id.clone(), king_path, 0);
    let rook_move = Move::new(rook.id.clone(), rook_path, 0);
    king_move.extra_move = Some(Box::new(rook_move));
    king_move
}
