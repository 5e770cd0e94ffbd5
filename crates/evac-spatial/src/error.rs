//! Spatial-subsystem error type.

use thiserror::Error;

/// Errors produced by `evac-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("invalid cell code {code} at {row},{col}")]
    InvalidCellCode { row: usize, col: usize, code: i64 },

    #[error("grid dimension mismatch: expected {expected} {what}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
