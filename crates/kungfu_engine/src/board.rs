//! Pieces and the board.
//!
//! The board exclusively owns every piece ever placed on it. Captured
//! pieces flip their `captured` flag but stay addressable by id so that
//! late events (and replays) can still refer to them.

use std::collections::HashMap;

use crate::types::{BoardKind, PieceKind, PlayerNum};

/// A chess piece.
///
/// `row`/`col` hold the piece's *resting* position and may be fractional
/// only transiently (they are snapped to the final waypoint when a move
/// completes). Positions during travel are derived from the active move by
/// the collision module, not stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    /// Stable identity of the form `TYPE:PLAYER:ORIG_ROW:ORIG_COL`,
    /// assigned at creation and never reused.
    pub id: String,
    pub kind: PieceKind,
    pub player: PlayerNum,
    pub row: f64,
    pub col: f64,
    /// True once any move has completed. Gates castling and the two-square
    /// pawn push.
    pub moved: bool,
    /// Terminal; captured pieces are never resurrected.
    pub captured: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, player: PlayerNum, row: i32, col: i32) -> Self {
        Piece {
            id: format!("{}:{}:{}:{}", kind.letter(), player, row, col),
            kind,
            player,
            row: row as f64,
            col: col as f64,
            moved: false,
            captured: false,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.row, self.col)
    }

    /// The integer square this piece counts as occupying, rounded half-up.
    pub fn grid_position(&self) -> (i32, i32) {
        (round_half_up(self.row), round_half_up(self.col))
    }
}

pub(crate) fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

/// Back-row piece order shared by every player.
const BACK_ROW: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// The playing field: a variant tag, dimensions, and the ordered collection
/// of all pieces ever placed.
#[derive(Debug, Clone)]
pub struct Board {
    pub kind: BoardKind,
    pub width: i32,
    pub height: i32,
    pieces: Vec<Piece>,
    by_id: HashMap<String, usize>,
}

impl Board {
    /// An empty board of the given variant.
    pub fn empty(kind: BoardKind) -> Self {
        let (width, height) = match kind {
            BoardKind::Standard => (8, 8),
            BoardKind::FourPlayer => (12, 12),
        };
        Board {
            kind,
            width,
            height,
            pieces: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Standard 8x8 chess with player 1 at the bottom (rows 6-7) and
    /// player 2 at the top (rows 0-1).
    pub fn standard() -> Self {
        let mut board = Board::empty(BoardKind::Standard);
        for (col, kind) in BACK_ROW.iter().enumerate() {
            board.add_piece(Piece::new(*kind, 2, 0, col as i32));
        }
        for col in 0..8 {
            board.add_piece(Piece::new(PieceKind::Pawn, 2, 1, col));
        }
        for col in 0..8 {
            board.add_piece(Piece::new(PieceKind::Pawn, 1, 6, col));
        }
        for (col, kind) in BACK_ROW.iter().enumerate() {
            board.add_piece(Piece::new(*kind, 1, 7, col as i32));
        }
        board
    }

    /// 12x12 four-player board. Player 1 East (cols 10-11), player 2 South
    /// (rows 10-11), player 3 West (cols 0-1), player 4 North (rows 0-1);
    /// each back row spans indices 2-9, pawns on the next axis inward.
    pub fn four_player() -> Self {
        let mut board = Board::empty(BoardKind::FourPlayer);
        for (i, kind) in BACK_ROW.iter().enumerate() {
            let along = 2 + i as i32;
            board.add_piece(Piece::new(*kind, 1, along, 11));
            board.add_piece(Piece::new(PieceKind::Pawn, 1, along, 10));
            board.add_piece(Piece::new(*kind, 2, 11, along));
            board.add_piece(Piece::new(PieceKind::Pawn, 2, 10, along));
            board.add_piece(Piece::new(*kind, 3, along, 0));
            board.add_piece(Piece::new(PieceKind::Pawn, 3, along, 1));
            board.add_piece(Piece::new(*kind, 4, 0, along));
            board.add_piece(Piece::new(PieceKind::Pawn, 4, 1, along));
        }
        board
    }

    pub fn add_piece(&mut self, piece: Piece) {
        self.by_id.insert(piece.id.clone(), self.pieces.len());
        self.pieces.push(piece);
    }

    /// All pieces, captured ones included.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, piece_id: &str) -> Option<&Piece> {
        self.by_id.get(piece_id).map(|&i| &self.pieces[i])
    }

    pub fn piece_mut(&mut self, piece_id: &str) -> Option<&mut Piece> {
        let i = *self.by_id.get(piece_id)?;
        Some(&mut self.pieces[i])
    }

    /// First uncaptured piece whose grid position matches the square.
    pub fn piece_at(&self, row: i32, col: i32) -> Option<&Piece> {
        self.pieces
            .iter()
            .filter(|p| !p.captured)
            .find(|p| p.grid_position() == (row, col))
    }

    /// All uncaptured pieces belonging to a player.
    pub fn player_pieces(&self, player: PlayerNum) -> impl Iterator<Item = &Piece> {
        self.pieces
            .iter()
            .filter(move |p| p.player == player && !p.captured)
    }

    /// The player's king, if it is still on the board.
    pub fn king(&self, player: PlayerNum) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|p| p.kind == PieceKind::King && p.player == player && !p.captured)
    }

    /// Whether a square exists on this board. The four-player board has
    /// 2x2 corners cut out.
    pub fn is_valid_square(&self, row: i32, col: i32) -> bool {
        if row < 0 || row >= self.height || col < 0 || col >= self.width {
            return false;
        }
        if self.kind == BoardKind::FourPlayer {
            let near_top = row < 2;
            let near_bottom = row >= self.height - 2;
            let near_left = col < 2;
            let near_right = col >= self.width - 2;
            if (near_top || near_bottom) && (near_left || near_right) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piece_id_format() {
        let piece = Piece::new(PieceKind::Pawn, 1, 6, 4);
        assert_eq!(piece.id, "P:1:6:4");
        assert!(!piece.moved);
        assert!(!piece.captured);
    }

    #[test]
    fn grid_position_rounds_half_up() {
        let mut piece = Piece::new(PieceKind::Pawn, 1, 6, 4);
        piece.row = 5.6;
        assert_eq!(piece.grid_position(), (6, 4));
        piece.row = 5.5;
        assert_eq!(piece.grid_position(), (6, 4));
        piece.row = 5.4;
        assert_eq!(piece.grid_position(), (5, 4));
    }

    #[test]
    fn standard_board_setup() {
        let board = Board::standard();
        assert_eq!(board.pieces().len(), 32);
        assert_eq!(board.player_pieces(1).count(), 16);
        assert_eq!(board.player_pieces(2).count(), 16);
        assert_eq!(board.king(1).map(|k| k.grid_position()), Some((7, 4)));
        assert_eq!(board.king(2).map(|k| k.grid_position()), Some((0, 4)));
        assert_eq!(
            board.piece_at(7, 0).map(|p| p.kind),
            Some(PieceKind::Rook)
        );
    }

    #[test]
    fn four_player_board_setup() {
        let board = Board::four_player();
        assert_eq!(board.pieces().len(), 64);
        for player in 1..=4 {
            assert_eq!(board.player_pieces(player).count(), 16);
            assert!(board.king(player).is_some());
        }
    }

    #[test]
    fn four_player_corners_are_invalid() {
        let board = Board::four_player();
        assert!(!board.is_valid_square(0, 0));
        assert!(!board.is_valid_square(1, 1));
        assert!(!board.is_valid_square(0, 11));
        assert!(!board.is_valid_square(11, 0));
        assert!(!board.is_valid_square(10, 10));
        assert!(board.is_valid_square(0, 2));
        assert!(board.is_valid_square(2, 0));
        assert!(board.is_valid_square(6, 6));
    }

    #[test]
    fn piece_lookup_by_id_and_square() {
        let board = Board::standard();
        let pawn = board.piece("P:1:6:4").expect("pawn exists");
        assert_eq!(pawn.grid_position(), (6, 4));
        assert!(board.piece_at(4, 4).is_none());
    }
}
