//! Scenario documents: the grid plus the initial agents, as JSON.
//!
//! ```json
//! {
//!   "rows": 3, "columns": 4,
//!   "grid": [[2,0,0,0],[1,1,0,1],[0,0,0,0]],
//!   "agents": [
//!     {"id": 1, "x": 2, "y": 0, "behaviorKind": 0, "age": 30, "reducedMobility": false},
//!     {"id": 2, "x": 2, "y": 3, "behaviorKind": 3}
//!   ]
//! }
//! ```
//!
//! `x` is the row and `y` the column.  Cell codes are 0 floor, 1 wall,
//! 2 exit; behaviour codes are 0 normal, 1 panic, 2 reduced mobility,
//! 3 rescuer.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use evac_agent::{Agent, AgentError, BehaviorKind, Evacuee, Rescuer};
use evac_core::{AgentId, IdGenerator, Position};
use evac_spatial::Grid;
use serde::{Deserialize, Serialize};

use crate::ScenarioError;

/// Age given to evacuees whose record omits it.
pub const DEFAULT_AGE: u32 = 30;
/// Panic level of evacuees loaded with the panic behaviour code.
pub const LOADED_PANIC_LEVEL: f64 = 0.8;

// ── Wire format ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    pub rows: i64,
    pub columns: i64,
    pub grid: Vec<Vec<i64>>,
    #[serde(default)]
    pub agents: Vec<AgentRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: i64,
    pub x: i32,
    pub y: i32,
    pub behavior_kind: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduced_mobility: Option<bool>,
}

impl AgentRecord {
    pub fn from_agent(agent: &Agent) -> Self {
        let pos = agent.position();
        let (age, reduced_mobility) = match agent.as_evacuee() {
            Some(e) => (Some(e.age() as i64), Some(e.reduced_mobility())),
            None => (None, None),
        };
        Self {
            id: agent.id().get() as i64,
            x: pos.row,
            y: pos.col,
            behavior_kind: agent.behavior().code() as i64,
            age,
            reduced_mobility,
        }
    }

    fn to_agent(&self) -> Result<Agent, ScenarioError> {
        let id = AgentId::try_from(self.id).map_err(|_| ScenarioError::InvalidId(self.id))?;
        if id == AgentId::INVALID {
            return Err(ScenarioError::InvalidId(self.id));
        }
        let pos = Position::new(self.x, self.y);
        let behavior = BehaviorKind::try_from(self.behavior_kind)?;

        if behavior == BehaviorKind::Rescuer {
            return Ok(Rescuer::new(id, pos).into());
        }
        let age = match self.age {
            Some(a) => u32::try_from(a).map_err(|_| AgentError::InvalidAge(a))?,
            None => DEFAULT_AGE,
        };
        let reduced = self
            .reduced_mobility
            .unwrap_or(behavior == BehaviorKind::ReducedMobility);
        let evacuee = Evacuee::new(id, pos, age, reduced);
        Ok(match behavior {
            BehaviorKind::Panic => evacuee.with_panic(LOADED_PANIC_LEVEL).into(),
            _ => evacuee.into(),
        })
    }
}

// ── Scenario ──────────────────────────────────────────────────────────────────

/// A validated grid plus its initial agents, in document order.
#[derive(Debug)]
pub struct Scenario {
    pub grid: Grid,
    pub agents: Vec<Agent>,
}

impl Scenario {
    pub fn new(grid: Grid, agents: Vec<Agent>) -> Self {
        Self { grid, agents }
    }

    /// Validate a parsed document: dimensions, cell codes, behaviour codes,
    /// unique ids, agents inside the grid.
    pub fn from_document(doc: &ScenarioDocument) -> Result<Self, ScenarioError> {
        let (Ok(rows), Ok(cols)) = (usize::try_from(doc.rows), usize::try_from(doc.columns)) else {
            return Err(ScenarioError::Dimensions { rows: doc.rows, columns: doc.columns });
        };
        let grid = Grid::from_codes(rows, cols, &doc.grid)?;

        let mut seen = HashSet::with_capacity(doc.agents.len());
        let mut agents = Vec::with_capacity(doc.agents.len());
        for record in &doc.agents {
            if !seen.insert(record.id) {
                return Err(ScenarioError::DuplicateId(record.id));
            }
            if !grid.in_bounds(Position::new(record.x, record.y)) {
                return Err(ScenarioError::OutOfBounds {
                    id: record.id,
                    row: record.x,
                    col: record.y,
                });
            }
            agents.push(record.to_agent()?);
        }
        Ok(Self { grid, agents })
    }

    pub fn to_document(&self) -> ScenarioDocument {
        document_for(&self.grid, &self.agents)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        let doc: ScenarioDocument = serde_json::from_str(json)?;
        Self::from_document(&doc)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// An id generator that continues after the highest loaded id.
    pub fn id_generator(&self) -> IdGenerator {
        let mut ids = IdGenerator::new();
        for agent in &self.agents {
            ids.observe(agent.id());
        }
        ids
    }
}

/// Build a document from any grid and agent list, e.g. a running
/// simulation's current state.
pub fn document_for(grid: &Grid, agents: &[Agent]) -> ScenarioDocument {
    ScenarioDocument {
        rows: grid.rows() as i64,
        columns: grid.cols() as i64,
        grid: grid.to_codes(),
        agents: agents.iter().map(AgentRecord::from_agent).collect(),
    }
}

/// Write `grid` and `agents` as a pretty-printed scenario document.
pub fn save(path: impl AsRef<Path>, grid: &Grid, agents: &[Agent]) -> Result<(), ScenarioError> {
    let json = serde_json::to_string_pretty(&document_for(grid, agents))?;
    fs::write(path, json)?;
    Ok(())
}
