//! Agent-subsystem error type.

use thiserror::Error;

/// Errors produced by `evac-agent`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no prototype named {0:?}")]
    UnknownPrototype(String),

    #[error("unknown behavior code {0}")]
    UnknownBehavior(i64),

    #[error("invalid age {0}")]
    InvalidAge(i64),
}

pub type AgentResult<T> = Result<T, AgentError>;
