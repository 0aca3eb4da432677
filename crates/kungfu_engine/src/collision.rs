//! Continuous-space collision detection and capture resolution.
//!
//! Runs once per tick after positions advance. Two uncaptured enemy
//! pieces collide when their interpolated positions come within
//! `CAPTURE_DISTANCE`; the winner is decided by capture ability and
//! movement-start ordering. Knights are airborne for the first 85% of
//! their jump and can neither capture nor be captured during it.

use std::collections::HashMap;

use crate::board::{Board, Piece};
use crate::constants::{CAPTURE_DISTANCE, KNIGHT_AIRBORNE_FRACTION};
use crate::moves::Move;
use crate::types::{PieceKind, Tick};

/// A capture produced by the resolver. `capturing_piece_id` is empty for
/// mutual destruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub capturing_piece_id: String,
    pub captured_piece_id: String,
    pub position: (f64, f64),
}

/// A piece's position at the current tick. For a stationary piece this is
/// its resting position; for a traveling piece, the linear interpolation
/// along the current path segment.
pub fn interpolated_position(
    piece: &Piece,
    mv: Option<&Move>,
    current_tick: Tick,
    ticks_per_square: Tick,
) -> (f64, f64) {
    let Some(mv) = mv else {
        return piece.position();
    };

    let elapsed = current_tick - mv.start_tick;
    if elapsed < 0 {
        return piece.position();
    }

    let total_squares = mv.num_squares();
    if total_squares == 0 {
        return mv.start_position();
    }

    let total_ticks = total_squares * ticks_per_square;
    if elapsed >= total_ticks {
        return mv.end_position();
    }

    let progress = elapsed as f64 / ticks_per_square as f64;
    let segment = progress.floor() as usize;
    let segment_progress = progress - segment as f64;

    if segment as i64 >= total_squares {
        return mv.end_position();
    }

    let (start_row, start_col) = mv.path[segment];
    let (end_row, end_col) = mv.path[segment + 1];
    (
        start_row + (end_row - start_row) * segment_progress,
        start_col + (end_col - start_col) * segment_progress,
    )
}

/// A knight's position for collision purposes: `None` while airborne.
/// Once visible it interpolates linearly from start to end by overall
/// progress, matching what observers see of the jump arc's tail.
pub fn knight_position(
    piece: &Piece,
    mv: Option<&Move>,
    current_tick: Tick,
    ticks_per_square: Tick,
) -> Option<(f64, f64)> {
    let Some(mv) = mv else {
        return Some(piece.position());
    };

    let elapsed = current_tick - mv.start_tick;
    if elapsed < 0 {
        return Some(piece.position());
    }

    let total_ticks = 2 * ticks_per_square;
    if (elapsed as f64) < total_ticks as f64 * KNIGHT_AIRBORNE_FRACTION {
        return None;
    }
    if elapsed >= total_ticks {
        return Some(mv.end_position());
    }

    let progress = elapsed as f64 / total_ticks as f64;
    let (start_row, start_col) = mv.start_position();
    let (end_row, end_col) = mv.end_position();
    Some((
        start_row + (end_row - start_row) * progress,
        start_col + (end_col - start_col) * progress,
    ))
}

/// A jumping knight may capture only in the tail of its travel, the
/// same window in which it is visible.
pub fn can_knight_capture(mv: &Move, current_tick: Tick, ticks_per_square: Tick) -> bool {
    let elapsed = current_tick - mv.start_tick;
    let total_ticks = 2 * ticks_per_square;
    elapsed as f64 / total_ticks as f64 >= KNIGHT_AIRBORNE_FRACTION
}

/// Position of a piece given the full active move list. Convenience for
/// state views; the resolver itself pre-indexes moves.
pub fn piece_position(
    piece: &Piece,
    active_moves: &[Move],
    current_tick: Tick,
    ticks_per_square: Tick,
) -> (f64, f64) {
    let mv = crate::moves::find_move(&piece.id, active_moves);
    if piece.kind == PieceKind::Knight {
        knight_position(piece, mv, current_tick, ticks_per_square)
            .unwrap_or_else(|| piece.position())
    } else {
        interpolated_position(piece, mv, current_tick, ticks_per_square)
    }
}

/// Detect all captures at the current tick.
pub fn detect_collisions(
    board: &Board,
    active_moves: &[Move],
    current_tick: Tick,
    ticks_per_square: Tick,
) -> Vec<Capture> {
    let move_by_piece: HashMap<&str, &Move> = active_moves
        .iter()
        .map(|m| (m.piece_id.as_str(), m))
        .collect();

    // Two stationary pieces cannot collide, so split the population once.
    let mut moving: Vec<(&Piece, (f64, f64))> = Vec::new();
    let mut stationary: Vec<(&Piece, (f64, f64))> = Vec::new();

    for piece in board.pieces() {
        if piece.captured {
            continue;
        }

        let mv = move_by_piece.get(piece.id.as_str()).copied();
        let pos = if piece.kind == PieceKind::Knight {
            match knight_position(piece, mv, current_tick, ticks_per_square) {
                Some(pos) => pos,
                None => continue, // airborne
            }
        } else {
            interpolated_position(piece, mv, current_tick, ticks_per_square)
        };

        if mv.is_some() {
            moving.push((piece, pos));
        } else {
            stationary.push((piece, pos));
        }
    }

    let mut captures = Vec::new();

    for (i, &(piece_a, pos_a)) in moving.iter().enumerate() {
        for &(piece_b, pos_b) in &moving[i + 1..] {
            check_pair(
                piece_a,
                pos_a,
                piece_b,
                pos_b,
                &move_by_piece,
                current_tick,
                ticks_per_square,
                &mut captures,
            );
        }
        for &(piece_b, pos_b) in &stationary {
            check_pair(
                piece_a,
                pos_a,
                piece_b,
                pos_b,
                &move_by_piece,
                current_tick,
                ticks_per_square,
                &mut captures,
            );
        }
    }

    captures
}

#[allow(clippy::too_many_arguments)]
fn check_pair(
    piece_a: &Piece,
    pos_a: (f64, f64),
    piece_b: &Piece,
    pos_b: (f64, f64),
    move_by_piece: &HashMap<&str, &Move>,
    current_tick: Tick,
    ticks_per_square: Tick,
    captures: &mut Vec<Capture>,
) {
    if piece_a.player == piece_b.player {
        return;
    }

    // Axis-aligned rejection before the Euclidean check.
    let dr = pos_a.0 - pos_b.0;
    let dc = pos_a.1 - pos_b.1;
    if dr.abs() >= CAPTURE_DISTANCE || dc.abs() >= CAPTURE_DISTANCE {
        return;
    }
    if (dr * dr + dc * dc).sqrt() >= CAPTURE_DISTANCE {
        return;
    }

    let move_a = move_by_piece.get(piece_a.id.as_str()).copied();
    let move_b = move_by_piece.get(piece_b.id.as_str()).copied();

    if piece_a.kind == PieceKind::Knight {
        if let Some(mv) = move_a {
            if !can_knight_capture(mv, current_tick, ticks_per_square) {
                return;
            }
        }
    }
    if piece_b.kind == PieceKind::Knight {
        if let Some(mv) = move_b {
            if !can_knight_capture(mv, current_tick, ticks_per_square) {
                return;
            }
        }
    }

    let position = ((pos_a.0 + pos_b.0) / 2.0, (pos_a.1 + pos_b.1) / 2.0);

    match capture_winner(piece_a, move_a, piece_b, move_b) {
        Outcome::Wins(winner_is_a) => {
            let (winner, loser) = if winner_is_a {
                (piece_a, piece_b)
            } else {
                (piece_b, piece_a)
            };
            captures.push(Capture {
                capturing_piece_id: winner.id.clone(),
                captured_piece_id: loser.id.clone(),
                position,
            });
        }
        Outcome::MutualDestruction => {
            captures.push(Capture {
                capturing_piece_id: String::new(),
                captured_piece_id: piece_a.id.clone(),
                position,
            });
            captures.push(Capture {
                capturing_piece_id: String::new(),
                captured_piece_id: piece_b.id.clone(),
                position,
            });
        }
        Outcome::None => {}
    }
}

enum Outcome {
    /// `true` if piece A survives.
    Wins(bool),
    MutualDestruction,
    None,
}

/// Decide which collider survives:
/// 1. straight-moving pawns cannot capture; between two of them the
///    earlier start survives, a tie kills both;
/// 2. if exactly one side can capture, it wins;
/// 3. otherwise a moving piece beats a stationary one, the earlier
///    `start_tick` wins between two movers, and a tie is mutual
///    destruction.
fn capture_winner(
    piece_a: &Piece,
    move_a: Option<&Move>,
    piece_b: &Piece,
    move_b: Option<&Move>,
) -> Outcome {
    let a_can_capture = can_piece_capture(piece_a, move_a);
    let b_can_capture = can_piece_capture(piece_b, move_b);

    if !a_can_capture && !b_can_capture {
        return match (move_a, move_b) {
            (Some(a), Some(b)) if a.start_tick < b.start_tick => Outcome::Wins(true),
            (Some(a), Some(b)) if b.start_tick < a.start_tick => Outcome::Wins(false),
            _ => Outcome::MutualDestruction,
        };
    }

    if a_can_capture != b_can_capture {
        return Outcome::Wins(a_can_capture);
    }

    match (move_a, move_b) {
        (Some(_), None) => Outcome::Wins(true),
        (None, Some(_)) => Outcome::Wins(false),
        (None, None) => Outcome::None,
        (Some(a), Some(b)) => {
            if a.start_tick < b.start_tick {
                Outcome::Wins(true)
            } else if b.start_tick < a.start_tick {
                Outcome::Wins(false)
            } else {
                Outcome::MutualDestruction
            }
        }
    }
}

/// A pawn whose in-flight move keeps its lateral coordinate fixed is
/// moving straight and cannot capture. Pawn moves either advance purely
/// forward (exactly one coordinate changes, on either board variant) or
/// capture diagonally (both change), so the lateral coordinate is
/// whichever one the move leaves untouched.
fn is_pawn_moving_straight(piece: &Piece, mv: Option<&Move>) -> bool {
    if piece.kind != PieceKind::Pawn {
        return false;
    }
    let Some(mv) = mv else {
        return false;
    };
    if mv.path.len() < 2 {
        return false;
    }

    let (start_row, start_col) = mv.start_position();
    let (end_row, end_col) = mv.end_position();
    (start_row == end_row) != (start_col == end_col)
}

fn can_piece_capture(piece: &Piece, mv: Option<&Move>) -> bool {
    !is_pawn_moving_straight(piece, mv)
}
