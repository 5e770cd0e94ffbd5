//! Plain state enums shared by every agent variant.

use std::fmt;

use evac_core::AgentId;

use crate::AgentError;

// ── AgentState ────────────────────────────────────────────────────────────────

/// Lifecycle state.  Exactly one at a time; `Evacuated` is terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentState {
    #[default]
    Normal,
    Evacuating,
    Panicked,
    Evacuated,
    Blocked,
}

impl AgentState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == AgentState::Evacuated
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Normal => "normal",
            AgentState::Evacuating => "evacuating",
            AgentState::Panicked => "panicked",
            AgentState::Evacuated => "evacuated",
            AgentState::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

// ── BehaviorKind ──────────────────────────────────────────────────────────────

/// Behaviour profile.  The discriminants are the scenario document codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BehaviorKind {
    #[default]
    Normal          = 0,
    Panic           = 1,
    ReducedMobility = 2,
    Rescuer         = 3,
}

impl BehaviorKind {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for BehaviorKind {
    type Error = AgentError;

    fn try_from(code: i64) -> Result<Self, AgentError> {
        match code {
            0 => Ok(BehaviorKind::Normal),
            1 => Ok(BehaviorKind::Panic),
            2 => Ok(BehaviorKind::ReducedMobility),
            3 => Ok(BehaviorKind::Rescuer),
            other => Err(AgentError::UnknownBehavior(other)),
        }
    }
}

// ── AgentKind ─────────────────────────────────────────────────────────────────

/// Which variant an agent is.  Carried on events so observers never need
/// the agent itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentKind {
    Evacuee,
    Rescuer,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Evacuee => f.write_str("evacuee"),
            AgentKind::Rescuer => f.write_str("rescuer"),
        }
    }
}

// ── Notice ────────────────────────────────────────────────────────────────────

/// Something an agent reports about itself during a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notice {
    /// Entered `Evacuating` from `Normal` or `Blocked`.
    StartedEvacuating,
    /// Panic crossed the panic threshold.
    Panicked,
    /// Panic dropped back below the calm threshold.
    Calmed,
    Blocked,
    Evacuated,
    /// An evacuee lost a contested cell.
    ObstacleHit,
    /// A rescuer lost a contested cell.  Rescuers never panic.
    RescuerObstacle,
    Assisting(AgentId),
    Released(AgentId),
}
