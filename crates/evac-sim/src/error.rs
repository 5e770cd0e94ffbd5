use evac_agent::AgentError;
use evac_core::EvacError;
use evac_spatial::SpatialError;
use thiserror::Error;

use crate::SimStatus;

/// Failures that stop the simulation from starting or from accepting a
/// command.  Runtime stalls are never errors; they show up as agent and
/// simulation state.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no scenario loaded")]
    NoScenario,

    #[error("scenario has no agents")]
    NoAgents,

    #[error("scenario has no exit cell")]
    NoExit,

    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("cannot {action} while the simulation is {status}")]
    InvalidState {
        action: &'static str,
        status: SimStatus,
    },

    #[error(transparent)]
    Core(#[from] EvacError),

    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),
}

pub type SimResult<T> = Result<T, SimError>;

/// Problems reading or writing a scenario document.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid grid: {0}")]
    Grid(#[from] SpatialError),

    #[error("invalid agent: {0}")]
    Agent(#[from] AgentError),

    #[error("invalid dimensions {rows}x{columns}")]
    Dimensions { rows: i64, columns: i64 },

    #[error("invalid agent id {0}")]
    InvalidId(i64),

    #[error("duplicate agent id {0}")]
    DuplicateId(i64),

    #[error("agent {id} at {row},{col} is outside the grid")]
    OutOfBounds { id: i64, row: i32, col: i32 },
}
