//! Knight move geometry.

use crate::moves::Path;

/// All eight L-shaped offsets.
pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Path for an L-shaped jump: exactly three points, with a fractional
/// midpoint at the arithmetic mean of start and end. Two segments, so the
/// jump takes `2 * ticks_per_square`.
pub fn knight_path(from_row: i32, from_col: i32, to_row: i32, to_col: i32) -> Option<Path> {
    let row_diff = (to_row - from_row).abs();
    let col_diff = (to_col - from_col).abs();

    if !((row_diff == 2 && col_diff == 1) || (row_diff == 1 && col_diff == 2)) {
        return None;
    }

    let mid_row = (from_row + to_row) as f64 / 2.0;
    let mid_col = (from_col + to_col) as f64 / 2.0;

    let mut path = Path::new();
    path.push((from_row as f64, from_col as f64));
    path.push((mid_row, mid_col));
    path.push((to_row as f64, to_col as f64));
    Some(path)
}
