//! Player orientations for the four-player board.
//!
//! Each seat plays from one edge of the 12x12 board; "forward" for its
//! pawns points at the opposite edge, along a row axis or a column axis.

use crate::types::PlayerNum;

/// Which coordinate a player's pawns advance along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

/// Movement frame for one seat on the four-player board.
#[derive(Debug, Clone, Copy)]
pub struct PlayerOrientation {
    /// `(row_delta, col_delta)` of a one-square pawn push.
    pub forward: (i32, i32),
    /// Row or column index where this seat's pawns start.
    pub pawn_home_axis: i32,
    /// Row or column index of this seat's back row.
    pub back_row_axis: i32,
    /// Row or column index that triggers pawn promotion.
    pub promotion_axis: i32,
    /// The axis pawns move along.
    pub axis: Axis,
}

// Player 1 (East): pieces on cols 10-11, pawns move left toward col 2.
// Player 2 (South): pieces on rows 10-11, pawns move up toward row 2.
// Player 3 (West): pieces on cols 0-1, pawns move right toward col 9.
// Player 4 (North): pieces on rows 0-1, pawns move down toward row 9.
const ORIENTATIONS: [PlayerOrientation; 4] = [
    PlayerOrientation {
        forward: (0, -1),
        pawn_home_axis: 10,
        back_row_axis: 11,
        promotion_axis: 2,
        axis: Axis::Col,
    },
    PlayerOrientation {
        forward: (-1, 0),
        pawn_home_axis: 10,
        back_row_axis: 11,
        promotion_axis: 2,
        axis: Axis::Row,
    },
    PlayerOrientation {
        forward: (0, 1),
        pawn_home_axis: 1,
        back_row_axis: 0,
        promotion_axis: 9,
        axis: Axis::Col,
    },
    PlayerOrientation {
        forward: (1, 0),
        pawn_home_axis: 1,
        back_row_axis: 0,
        promotion_axis: 9,
        axis: Axis::Row,
    },
];

/// Orientation for a seat on the four-player board.
pub fn orientation(player: PlayerNum) -> Option<&'static PlayerOrientation> {
    match player {
        1..=4 => Some(&ORIENTATIONS[player as usize - 1]),
        _ => None,
    }
}
