//! Agent creation: id assignment, named prototypes and scattered groups.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use evac_core::{AgentId, IdGenerator, Position, SimRng};
use tracing::debug;

use crate::{Agent, AgentError, AgentResult, Evacuee, Rescuer};

/// Chance that a member of a generated group has reduced mobility.
pub const GROUP_REDUCED_MOBILITY_CHANCE: f64 = 0.1;
/// Group ages are drawn uniformly from `mean_age ± GROUP_AGE_SPREAD`.
pub const GROUP_AGE_SPREAD: u32 = 10;

/// Creates agents with unique, monotonically increasing ids.
///
/// Owns its [`IdGenerator`]; two factories never share a counter.
///
/// ```
/// use evac_agent::AgentFactory;
/// use evac_core::Position;
///
/// let mut factory = AgentFactory::new();
/// let a = factory.evacuee(Position::new(1, 1), 30, false);
/// let b = factory.from_prototype("rescuer", Position::new(2, 2)).unwrap();
/// assert!(a.id() < b.id());
/// ```
pub struct AgentFactory {
    ids: IdGenerator,
    prototypes: BTreeMap<String, Agent>,
}

impl AgentFactory {
    /// A factory pre-seeded with the `adult`, `elderly`, `reduced_mobility`
    /// and `rescuer` prototypes.
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::new())
    }

    /// Use an existing generator, e.g. one that has observed loaded ids.
    pub fn with_ids(ids: IdGenerator) -> Self {
        let origin = Position::default();
        let mut prototypes = BTreeMap::new();
        let defaults: [(&str, Agent); 4] = [
            ("adult", Evacuee::new(AgentId::INVALID, origin, 30, false).into()),
            ("elderly", Evacuee::new(AgentId::INVALID, origin, 70, false).into()),
            ("reduced_mobility", Evacuee::new(AgentId::INVALID, origin, 40, true).into()),
            ("rescuer", Rescuer::new(AgentId::INVALID, origin).into()),
        ];
        for (name, agent) in defaults {
            prototypes.insert(name.to_owned(), agent);
        }
        Self { ids, prototypes }
    }

    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    pub fn evacuee(&mut self, position: Position, age: u32, reduced_mobility: bool) -> Agent {
        Evacuee::new(self.ids.next_id(), position, age, reduced_mobility).into()
    }

    pub fn rescuer(&mut self, position: Position) -> Agent {
        Rescuer::new(self.ids.next_id(), position).into()
    }

    /// Register (or replace) a named prototype.
    pub fn register_prototype(&mut self, name: impl Into<String>, prototype: Agent) {
        self.prototypes.insert(name.into(), prototype);
    }

    pub fn prototype_names(&self) -> impl Iterator<Item = &str> {
        self.prototypes.keys().map(String::as_str)
    }

    /// Clone a registered prototype under a fresh id at `position`.
    pub fn from_prototype(&mut self, name: &str, position: Position) -> AgentResult<Agent> {
        let proto = self
            .prototypes
            .get(name)
            .ok_or_else(|| AgentError::UnknownPrototype(name.to_owned()))?;
        let mut agent = proto.clone_with_id(self.ids.next_id());
        agent.set_position(position);
        Ok(agent)
    }

    /// `count` evacuees scattered uniformly by angle and radius around
    /// `center`, rounded to the nearest cell.
    ///
    /// Positions are not checked against any grid; callers drop or move
    /// members that land on walls or off the map.
    pub fn evacuee_group(
        &mut self,
        count: usize,
        center: Position,
        mean_age: u32,
        radius: f64,
        rng: &mut SimRng,
    ) -> Vec<Agent> {
        let low = mean_age.saturating_sub(GROUP_AGE_SPREAD);
        let high = mean_age + GROUP_AGE_SPREAD;
        let group: Vec<Agent> = (0..count)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                let r = if radius > 0.0 { rng.gen_range(0.0..radius) } else { 0.0 };
                let pos = Position::new(
                    (center.row as f64 + r * angle.cos()).round() as i32,
                    (center.col as f64 + r * angle.sin()).round() as i32,
                );
                let age = rng.gen_range(low..=high);
                let reduced = rng.gen_bool(GROUP_REDUCED_MOBILITY_CHANCE);
                self.evacuee(pos, age, reduced)
            })
            .collect();
        debug!(count, %center, mean_age, radius, "created evacuee group");
        group
    }
}

impl Default for AgentFactory {
    fn default() -> Self {
        Self::new()
    }
}
