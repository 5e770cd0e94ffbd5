//! The scenario's occupancy grid.
//!
//! # Data layout
//!
//! Cells are stored row-major in one flat `Vec<CellKind>`:
//!
//! ```text
//! cells[ row * cols + col ]
//! ```
//!
//! Dimensions are fixed at construction.  Every accessor bounds-checks its
//! `Position` first, so out-of-range reads answer "not transitable" and
//! out-of-range writes are ignored.

use evac_core::Position;

use crate::{SpatialError, SpatialResult};

// ── CellKind ──────────────────────────────────────────────────────────────────

/// Classification of one grid cell.  The discriminants are the codes used
/// by the scenario document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CellKind {
    #[default]
    Floor = 0,
    Wall  = 1,
    Exit  = 2,
}

impl CellKind {
    /// Decode a scenario cell code.
    pub fn from_code(code: i64) -> Option<CellKind> {
        match code {
            0 => Some(CellKind::Floor),
            1 => Some(CellKind::Wall),
            2 => Some(CellKind::Exit),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

/// Fixed-size 2-D cell array.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    /// An all-`Floor` grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellKind::Floor; rows * cols],
        }
    }

    /// Build a grid from nested rows of cell codes.
    ///
    /// Every row must have exactly `cols` entries and there must be exactly
    /// `rows` of them.
    pub fn from_codes(rows: usize, cols: usize, codes: &[Vec<i64>]) -> SpatialResult<Self> {
        if codes.len() != rows {
            return Err(SpatialError::DimensionMismatch {
                what: "rows",
                expected: rows,
                found: codes.len(),
            });
        }
        let mut cells = Vec::with_capacity(rows * cols);
        for (r, line) in codes.iter().enumerate() {
            if line.len() != cols {
                return Err(SpatialError::DimensionMismatch {
                    what: "columns",
                    expected: cols,
                    found: line.len(),
                });
            }
            for (c, &code) in line.iter().enumerate() {
                let kind = CellKind::from_code(code)
                    .ok_or(SpatialError::InvalidCellCode { row: r, col: c, code })?;
                cells.push(kind);
            }
        }
        Ok(Self { rows, cols, cells })
    }

    /// Nested rows of cell codes, the inverse of [`from_codes`](Self::from_codes).
    pub fn to_codes(&self) -> Vec<Vec<i64>> {
        self.cells
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().map(|k| k.code() as i64).collect())
            .collect()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `rows * cols`.
    #[inline]
    pub fn area(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.rows
            && (pos.col as usize) < self.cols
    }

    /// Flat index of `pos`, or `None` if it lies outside the grid.
    #[inline]
    pub fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.row as usize * self.cols + pos.col as usize)
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub fn position(&self, index: usize) -> Position {
        Position::new((index / self.cols) as i32, (index % self.cols) as i32)
    }

    pub fn cell(&self, pos: Position) -> Option<CellKind> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Overwrite one cell.  No-op outside the grid.
    pub fn set_cell(&mut self, pos: Position, kind: CellKind) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = kind;
        }
    }

    /// Set every cell back to `Floor`, keeping the dimensions.
    pub fn clear(&mut self) {
        self.cells.fill(CellKind::Floor);
    }

    /// `false` for walls and out-of-range cells; exits are transitable.
    #[inline]
    pub fn is_transitable(&self, pos: Position) -> bool {
        matches!(self.cell(pos), Some(CellKind::Floor | CellKind::Exit))
    }

    #[inline]
    pub fn is_exit(&self, pos: Position) -> bool {
        self.cell(pos) == Some(CellKind::Exit)
    }

    /// All exit cells in row-major order.
    pub fn exits(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == CellKind::Exit)
            .map(|(i, _)| self.position(i))
    }

    pub fn has_exit(&self) -> bool {
        self.cells.contains(&CellKind::Exit)
    }

    /// The exit with the smallest Euclidean distance to `origin`.
    ///
    /// Scans in row-major order and only replaces the current best on a
    /// strictly smaller distance, so among equidistant exits the first one
    /// scanned wins.  Reachability is not considered.
    pub fn nearest_exit(&self, origin: Position) -> Option<Position> {
        let mut best: Option<(Position, f64)> = None;
        for exit in self.exits() {
            let d = origin.distance(exit);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((exit, d));
            }
        }
        best.map(|(p, _)| p)
    }
}
