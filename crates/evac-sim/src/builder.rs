//! Fluent builder for constructing a [`Sim`].

use std::collections::HashSet;

use evac_agent::Agent;
use evac_core::{EvacError, SimConfig};
use evac_spatial::{BfsPathFinder, Grid, PathFinder};

use crate::{Scenario, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: tick duration, stagnation threshold, seed
/// - a [`Grid`], via [`grid`](Self::grid) or [`scenario`](Self::scenario)
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default           |
/// |----------------------|-------------------|
/// | `.agents(v)`         | no agents         |
/// | `.path_finder(p)`    | `BfsPathFinder`   |
///
/// An empty agent list builds fine; [`Sim::start`] refuses to run it.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config)
///     .grid(grid)
///     .agents(agents)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<P: PathFinder = BfsPathFinder> {
    config:      SimConfig,
    grid:        Option<Grid>,
    agents:      Vec<Agent>,
    path_finder: P,
}

impl SimBuilder<BfsPathFinder> {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            grid:        None,
            agents:      Vec::new(),
            path_finder: BfsPathFinder,
        }
    }
}

impl<P: PathFinder> SimBuilder<P> {
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Take both the grid and the agents from a loaded scenario.  Agents
    /// added earlier are kept and come first.
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.grid = Some(scenario.grid);
        self.agents.extend(scenario.agents);
        self
    }

    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Append agents.  Storage order is processing order every tick.
    pub fn agents(mut self, agents: impl IntoIterator<Item = Agent>) -> Self {
        self.agents.extend(agents);
        self
    }

    /// Swap the path-finding algorithm.
    pub fn path_finder<Q: PathFinder>(self, path_finder: Q) -> SimBuilder<Q> {
        SimBuilder {
            config: self.config,
            grid: self.grid,
            agents: self.agents,
            path_finder,
        }
    }

    /// Validate inputs and return an idle [`Sim`].
    pub fn build(self) -> SimResult<Sim<P>> {
        let grid = self.grid.ok_or(SimError::NoScenario)?;

        let dt = self.config.tick_duration_secs;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::Config(format!(
                "tick_duration_secs must be positive, got {dt}"
            )));
        }
        if self.config.max_ticks_without_movement == 0 {
            return Err(SimError::Config(
                "max_ticks_without_movement must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.agents.len());
        for agent in &self.agents {
            if !seen.insert(agent.id()) {
                return Err(EvacError::DuplicateAgent(agent.id()).into());
            }
        }

        Ok(Sim::new(self.config, grid, self.agents, self.path_finder))
    }
}
