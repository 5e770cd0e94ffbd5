//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `EvacError` as one
//! variant where they need to surface a core failure.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `evac-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum EvacError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("duplicate agent id {0}")]
    DuplicateAgent(AgentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `evac-core`.
pub type EvacResult<T> = Result<T, EvacError>;
