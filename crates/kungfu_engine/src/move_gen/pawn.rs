//! Pawn move geometry.
//!
//! Pawns push one square forward (two from their home row, both squares
//! empty) and capture one square diagonally forward, but only onto a
//! *stationary* enemy. A moving enemy on the target square is collision
//! business, not something pre-validation may promise.

use crate::board::{Board, Piece};
use crate::move_gen::orientation::{orientation, Axis};
use crate::moves::{is_piece_moving, Move, Path};
use crate::types::{BoardKind, PieceKind};

pub(super) fn pawn_path(
    piece: &Piece,
    board: &Board,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
) -> Option<Path> {
    match board.kind {
        BoardKind::Standard => pawn_path_standard(piece, board, to_row, to_col, active_moves),
        BoardKind::FourPlayer => pawn_path_four_player(piece, board, to_row, to_col, active_moves),
    }
}

fn pawn_path_standard(
    piece: &Piece,
    board: &Board,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
) -> Option<Path> {
    let (from_row, from_col) = piece.grid_position();
    // Player 1 advances toward row 0, player 2 toward row 7.
    let direction = if piece.player == 1 { -1 } else { 1 };
    let home_row = if piece.player == 1 { 6 } else { 1 };

    let row_diff = to_row - from_row;
    let col_diff = to_col - from_col;

    if col_diff == 0 {
        if row_diff == direction {
            if board.piece_at(to_row, to_col).is_some() {
                return None;
            }
            return Some(two_point_path(from_row, from_col, to_row, to_col));
        }

        if row_diff == 2 * direction && from_row == home_row && !piece.moved {
            let mid_row = from_row + direction;
            if board.piece_at(mid_row, from_col).is_some()
                || board.piece_at(to_row, to_col).is_some()
            {
                return None;
            }
            let mut path = two_point_path(from_row, from_col, mid_row, from_col);
            path.push((to_row as f64, to_col as f64));
            return Some(path);
        }
    }

    if col_diff.abs() == 1 && row_diff == direction {
        return diagonal_capture_path(
            piece, board, from_row, from_col, to_row, to_col, active_moves,
        );
    }

    None
}

fn pawn_path_four_player(
    piece: &Piece,
    board: &Board,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
) -> Option<Path> {
    let orient = orientation(piece.player)?;
    let (from_row, from_col) = piece.grid_position();
    let (fwd_row, fwd_col) = orient.forward;

    let row_diff = to_row - from_row;
    let col_diff = to_col - from_col;

    let (at_home, forward_diff, lateral_diff, forward_dir) = match orient.axis {
        Axis::Col => (
            from_col == orient.pawn_home_axis,
            col_diff,
            row_diff,
            fwd_col,
        ),
        Axis::Row => (
            from_row == orient.pawn_home_axis,
            row_diff,
            col_diff,
            fwd_row,
        ),
    };

    if lateral_diff == 0 {
        if forward_diff == forward_dir {
            if board.piece_at(to_row, to_col).is_some() {
                return None;
            }
            return Some(two_point_path(from_row, from_col, to_row, to_col));
        }

        if forward_diff == 2 * forward_dir && at_home && !piece.moved {
            let mid_row = from_row + fwd_row;
            let mid_col = from_col + fwd_col;
            if board.piece_at(mid_row, mid_col).is_some()
                || board.piece_at(to_row, to_col).is_some()
            {
                return None;
            }
            let mut path = two_point_path(from_row, from_col, mid_row, mid_col);
            path.push((to_row as f64, to_col as f64));
            return Some(path);
        }
    }

    if forward_diff == forward_dir && lateral_diff.abs() == 1 {
        return diagonal_capture_path(
            piece, board, from_row, from_col, to_row, to_col, active_moves,
        );
    }

    None
}

fn diagonal_capture_path(
    piece: &Piece,
    board: &Board,
    from_row: i32,
    from_col: i32,
    to_row: i32,
    to_col: i32,
    active_moves: &[Move],
) -> Option<Path> {
    let target = board.piece_at(to_row, to_col)?;
    if target.player == piece.player {
        return None;
    }
    if is_piece_moving(&target.id, active_moves) {
        return None;
    }
    Some(two_point_path(from_row, from_col, to_row, to_col))
}

fn two_point_path(from_row: i32, from_col: i32, to_row: i32, to_col: i32) -> Path {
    let mut path = Path::new();
    path.push((from_row as f64, from_col as f64));
    path.push((to_row as f64, to_col as f64));
    path
}

/// Whether a pawn that just finished a move at `(end_row, end_col)` stands
/// on its player's promotion line.
pub fn should_promote_pawn(piece: &Piece, board: &Board, end_row: i32, end_col: i32) -> bool {
    if piece.kind != PieceKind::Pawn {
        return false;
    }

    match board.kind {
        BoardKind::Standard => {
            let promotion_row = if piece.player == 1 { 0 } else { board.height - 1 };
            end_row == promotion_row
        }
        BoardKind::FourPlayer => match orientation(piece.player) {
            Some(orient) => match orient.axis {
                Axis::Col => end_col == orient.promotion_axis,
                Axis::Row => end_row == orient.promotion_axis,
            },
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_gen::compute_move_path;
    use crate::moves::path_from_squares;
    use crate::types::Speed;

    fn board_with(pieces: Vec<Piece>) -> Board {
        let mut board = Board::empty(BoardKind::Standard);
        for piece in pieces {
            board.add_piece(piece);
        }
        board
    }

    fn path_of(board: &Board, id: &str, to: (i32, i32), moves: &[Move]) -> Option<Path> {
        let piece = board.piece(id).unwrap();
        compute_move_path(piece, board, to.0, to.1, moves, 0, Speed::Standard.config())
    }

    #[test]
    fn single_push_onto_empty_square() {
        let board = board_with(vec![Piece::new(PieceKind::Pawn, 1, 6, 4)]);
        let path = path_of(&board, "P:1:6:4", (5, 4), &[]).unwrap();
        assert_eq!(path.as_slice(), &[(6.0, 4.0), (5.0, 4.0)]);
    }

    #[test]
    fn push_blocked_by_any_piece() {
        let board = board_with(vec![
            Piece::new(PieceKind::Pawn, 1, 6, 4),
            Piece::new(PieceKind::Pawn, 2, 5, 4),
        ]);
        assert!(path_of(&board, "P:1:6:4", (5, 4), &[]).is_none());
    }

    #[test]
    fn double_push_includes_intermediate() {
        let board = board_with(vec![Piece::new(PieceKind::Pawn, 1, 6, 4)]);
        let path = path_of(&board, "P:1:6:4", (4, 4), &[]).unwrap();
        assert_eq!(path.as_slice(), &[(6.0, 4.0), (5.0, 4.0), (4.0, 4.0)]);
    }

    #[test]
    fn double_push_requires_unmoved_pawn_on_home_row() {
        let mut board = board_with(vec![Piece::new(PieceKind::Pawn, 1, 6, 4)]);
        board.piece_mut("P:1:6:4").unwrap().moved = true;
        assert!(path_of(&board, "P:1:6:4", (4, 4), &[]).is_none());
    }

    #[test]
    fn diagonal_needs_stationary_enemy() {
        let board = board_with(vec![Piece::new(PieceKind::Pawn, 1, 6, 4)]);
        // No enemy at the target.
        assert!(path_of(&board, "P:1:6:4", (5, 5), &[]).is_none());

        let board = board_with(vec![
            Piece::new(PieceKind::Pawn, 1, 6, 4),
            Piece::new(PieceKind::Pawn, 2, 5, 5),
        ]);
        assert!(path_of(&board, "P:1:6:4", (5, 5), &[]).is_some());
    }

    #[test]
    fn diagonal_onto_moving_enemy_is_rejected() {
        let board = board_with(vec![
            Piece::new(PieceKind::Pawn, 1, 6, 4),
            Piece::new(PieceKind::Pawn, 2, 5, 5),
        ]);
        let enemy_move = Move::new("P:2:5:5", path_from_squares(&[(5, 5), (6, 5)]), 1);
        assert!(path_of(&board, "P:1:6:4", (5, 5), &[enemy_move]).is_none());
    }

    #[test]
    fn straight_push_cannot_capture() {
        let board = board_with(vec![
            Piece::new(PieceKind::Pawn, 1, 6, 4),
            Piece::new(PieceKind::Pawn, 2, 4, 4),
        ]);
        assert!(path_of(&board, "P:1:6:4", (4, 4), &[]).is_none());
    }

    #[test]
    fn four_player_pawn_moves_along_its_axis() {
        let board = Board::four_player();
        let cfg = Speed::Standard.config();
        // Player 1 pawn advances along columns (toward col 2).
        let pawn = board.piece("P:1:5:10").unwrap();
        assert!(compute_move_path(pawn, &board, 5, 9, &[], 0, cfg).is_some());
        assert!(compute_move_path(pawn, &board, 5, 8, &[], 0, cfg).is_some());
        assert!(compute_move_path(pawn, &board, 4, 10, &[], 0, cfg).is_none());
        // Player 2 pawn advances along rows (toward row 2).
        let pawn = board.piece("P:2:10:5").unwrap();
        assert!(compute_move_path(pawn, &board, 9, 5, &[], 0, cfg).is_some());
        assert!(compute_move_path(pawn, &board, 10, 4, &[], 0, cfg).is_none());
    }

    #[test]
    fn promotion_lines() {
        let board = Board::standard();
        let p1_pawn = board.piece("P:1:6:3").unwrap();
        assert!(should_promote_pawn(p1_pawn, &board, 0, 3));
        assert!(!should_promote_pawn(p1_pawn, &board, 1, 3));
        let p2_pawn = board.piece("P:2:1:3").unwrap();
        assert!(should_promote_pawn(p2_pawn, &board, 7, 3));

        let board4 = Board::four_player();
        let east_pawn = board4.piece("P:1:5:10").unwrap();
        assert!(should_promote_pawn(east_pawn, &board4, 5, 2));
        assert!(!should_promote_pawn(east_pawn, &board4, 2, 5));
    }
}
