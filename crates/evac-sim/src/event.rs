//! Typed values the tick loop emits for observers.

use std::fmt;

use evac_agent::{AgentKind, AgentState, BehaviorKind, Notice};
use evac_core::{AgentId, Position, Tick};

/// How a finished run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimOutcome {
    /// Every agent reached an exit.
    Evacuated,
    /// No agent changed cell for `max_ticks_without_movement` ticks.
    Stagnated,
    /// `max_ticks` was reached first.
    TickLimit,
}

impl fmt::Display for SimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimOutcome::Evacuated => f.write_str("evacuated"),
            SimOutcome::Stagnated => f.write_str("stagnated"),
            SimOutcome::TickLimit => f.write_str("tick limit"),
        }
    }
}

/// One agent leaving through an exit.  Emitted exactly once per agent.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvacuationEvent {
    pub agent_id: AgentId,
    pub kind: AgentKind,
    pub exit: Position,
    pub elapsed_secs: f64,
    pub steps: u32,
    /// The evacuee's condition as it left.  Always `false` for rescuers.
    pub panicked: bool,
    pub reduced_mobility: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimEvent {
    Started {
        agent_count: usize,
        rows: usize,
        cols: usize,
    },
    Moved {
        agent: AgentId,
        kind: AgentKind,
        from: Position,
        to: Position,
    },
    /// `agent` wanted `at` but another live agent stood there.
    Collision {
        agent: AgentId,
        at: Position,
    },
    Evacuated(EvacuationEvent),
    /// A notice an agent raised about itself this tick.
    Agent {
        agent: AgentId,
        kind: AgentKind,
        notice: Notice,
    },
    TickCompleted {
        tick: Tick,
        elapsed_secs: f64,
        live: usize,
        moved: bool,
    },
    Paused {
        tick: Tick,
    },
    Resumed {
        tick: Tick,
    },
    Finished {
        outcome: SimOutcome,
        tick: Tick,
        elapsed_secs: f64,
    },
    Reset,
}

/// Read-only per-agent snapshot for renderers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentView {
    pub id: AgentId,
    pub position: Position,
    pub state: AgentState,
    pub behavior: BehaviorKind,
}
