//! Integer grid coordinates.
//!
//! `Position` is the single coordinate type of the simulator: agent
//! locations, pathfinding nodes and statistics keys.  Components are signed
//! so neighbour arithmetic can step off the grid and be rejected by the
//! bounds check instead of wrapping.

use std::fmt;

/// A `(row, col)` cell coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// Fixed 4-neighbourhood expansion order: up, down, left, right.
    pub const NEIGHBOUR_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

    #[inline]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The cell `(dr, dc)` away from `self`.
    #[inline]
    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Self::new(self.row + dr, self.col + dc)
    }

    /// The four orthogonal neighbours in [`NEIGHBOUR_OFFSETS`](Self::NEIGHBOUR_OFFSETS) order.
    /// Neighbours may lie outside any grid.
    pub fn neighbours(self) -> [Position; 4] {
        Self::NEIGHBOUR_OFFSETS.map(|(dr, dc)| self.offset(dr, dc))
    }

    /// Euclidean distance in cells.
    #[inline]
    pub fn distance(self, other: Position) -> f64 {
        let dr = (other.row - self.row) as f64;
        let dc = (other.col - self.col) as f64;
        dr.hypot(dc)
    }

    /// Manhattan (4-connected) distance in cells.
    #[inline]
    pub fn manhattan(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// `true` if `other` is one orthogonal step away.
    #[inline]
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }

    /// Aggregation key `"row,col"` used by statistics and reports.
    pub fn key(self) -> String {
        self.to_string()
    }

    /// Parse a `"row,col"` key back into a position.
    pub fn parse_key(key: &str) -> Option<Position> {
        let (r, c) = key.split_once(',')?;
        Some(Position::new(r.trim().parse().ok()?, c.trim().parse().ok()?))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}
