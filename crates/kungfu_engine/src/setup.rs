//! Board setup strings for campaign levels and test layouts.
//!
//! One line per row, two ASCII characters per square: piece letter
//! (`P N B R Q K`) followed by the player digit, or `00` for an empty
//! square. Cut corners of the four-player board are written as `00` to
//! keep rows aligned.

use crate::board::{Board, Piece};
use crate::error::SetupError;
use crate::types::{BoardKind, PieceKind};

/// Parse a setup string into a board of the given variant.
pub fn parse_board_string(board_str: &str, kind: BoardKind) -> Result<Board, SetupError> {
    let lines: Vec<&str> = board_str
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut board = Board::empty(kind);
    let expected_rows = board.height as usize;
    let expected_cols = board.width as usize;

    if lines.len() != expected_rows {
        return Err(SetupError::RowCount {
            expected: expected_rows,
            got: lines.len(),
        });
    }

    for (row, line) in lines.iter().enumerate() {
        if line.len() != expected_cols * 2 {
            return Err(SetupError::RowLength {
                row,
                got: line.len(),
                expected: expected_cols * 2,
            });
        }

        for col in 0..expected_cols {
            // Byte-wise: the format is ASCII and slicing must not panic
            // on malformed input.
            let cell = &line.as_bytes()[col * 2..col * 2 + 2];
            if cell == b"00" {
                continue;
            }

            let kind_char = cell[0] as char;
            let player_char = cell[1] as char;

            let piece_kind = PieceKind::from_letter(kind_char)
                .ok_or(SetupError::UnknownPieceType(kind_char))?;
            let player = player_char
                .to_digit(10)
                .filter(|&d| (1..=4).contains(&d))
                .ok_or(SetupError::InvalidPlayer(player_char))? as u8;

            let (row, col) = (row as i32, col as i32);
            if !board.is_valid_square(row, col) {
                return Err(SetupError::InvalidSquare { row, col });
            }
            board.add_piece(Piece::new(piece_kind, player, row, col));
        }
    }

    Ok(board)
}

/// Render a board back into the setup-string format. Only uncaptured
/// pieces appear; used to persist custom starting positions in replays.
pub fn render_board_string(board: &Board) -> String {
    let mut out = String::with_capacity((board.width as usize * 2 + 1) * board.height as usize);
    for row in 0..board.height {
        for col in 0..board.width {
            match board.piece_at(row, col) {
                Some(piece) => {
                    out.push(piece.kind.letter());
                    out.push(char::from_digit(piece.player as u32, 10).unwrap_or('0'));
                }
                None => out.push_str("00"),
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_KINGS: &str = "\
0000000000K20000
0000000000000000
0000000000000000
0000000000000000
0000000000000000
0000000000000000
0000000000000000
0000000000K10000";

    #[test]
    fn parses_minimal_layout() {
        let board = parse_board_string(TWO_KINGS, BoardKind::Standard).unwrap();
        assert_eq!(board.pieces().len(), 2);
        assert_eq!(board.king(1).map(|k| k.grid_position()), Some((7, 5)));
        assert_eq!(board.king(2).map(|k| k.grid_position()), Some((0, 5)));
    }

    #[test]
    fn standard_board_round_trips() {
        let board = Board::standard();
        let rendered = render_board_string(&board);
        let reparsed = parse_board_string(&rendered, BoardKind::Standard).unwrap();
        assert_eq!(reparsed.pieces().len(), 32);
        for piece in board.pieces() {
            let other = reparsed.piece_at(
                piece.grid_position().0,
                piece.grid_position().1,
            );
            assert_eq!(other.map(|p| (p.kind, p.player)), Some((piece.kind, piece.player)));
        }
    }

    #[test]
    fn rejects_wrong_row_count() {
        let err = parse_board_string("0000\n0000", BoardKind::Standard).unwrap_err();
        assert_eq!(err, SetupError::RowCount { expected: 8, got: 2 });
    }

    #[test]
    fn rejects_unknown_piece() {
        let mut s = String::new();
        for row in 0..8 {
            s.push_str(if row == 0 { "X100000000000000\n" } else { "0000000000000000\n" });
        }
        let err = parse_board_string(&s, BoardKind::Standard).unwrap_err();
        assert_eq!(err, SetupError::UnknownPieceType('X'));
    }

    #[test]
    fn rejects_piece_in_cut_corner() {
        let mut rows = vec!["000000000000000000000000".to_string(); 12];
        rows[0] = "P1".to_string() + &"00".repeat(11);
        let s = rows.join("\n");
        let err = parse_board_string(&s, BoardKind::FourPlayer).unwrap_err();
        assert_eq!(err, SetupError::InvalidSquare { row: 0, col: 0 });
    }
}
