//! The `Sim` struct and its tick loop.

use std::fmt;

use evac_agent::rescuer::RELEASE_CALM;
use evac_agent::{Agent, AgentKind, AgentState};
use evac_core::{AgentId, AgentRng, EvacError, Position, SimClock, SimConfig, Tick};
use evac_spatial::{BfsPathFinder, CellKind, Grid, PathFinder};
use tracing::{debug, info, warn};

use crate::{
    AgentView, EvacuationEvent, Scenario, SimError, SimEvent, SimObserver, SimOutcome, SimResult,
};

#[cfg(feature = "fx-hash")]
type Map<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

/// Number of live agents standing on each cell.
type Occupancy = Map<Position, u32>;

// ── SimStatus ─────────────────────────────────────────────────────────────────

/// `Idle → Running → {Paused ⇄ Running} → Completed`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimStatus {
    Idle,
    Running,
    Paused,
    Completed(SimOutcome),
}

impl SimStatus {
    #[inline]
    pub fn is_running(self) -> bool {
        self == SimStatus::Running
    }

    pub fn outcome(self) -> Option<SimOutcome> {
        match self {
            SimStatus::Completed(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimStatus::Idle => f.write_str("idle"),
            SimStatus::Running => f.write_str("running"),
            SimStatus::Paused => f.write_str("paused"),
            SimStatus::Completed(o) => write!(f, "completed ({o})"),
        }
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Owns the grid and the live agents.  Agents are processed in storage order
/// every tick, so an agent stored earlier wins a contested cell.  Evacuated
/// agents are dropped from storage at the end of the tick that evacuated
/// them and never come back.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<P: PathFinder = BfsPathFinder> {
    /// Global configuration (tick duration, stagnation threshold, seed).
    pub config: SimConfig,

    /// Simulation clock: current tick and elapsed simulated seconds.
    pub clock: SimClock,

    grid: Grid,
    agents: Vec<Agent>,
    /// `AgentId` → index into `agents`.  Rebuilt whenever storage changes.
    index: Map<AgentId, usize>,
    rngs: Map<AgentId, AgentRng>,
    path_finder: P,
    status: SimStatus,
    ticks_without_movement: u32,
    evacuated: usize,
    events: Vec<SimEvent>,
}

impl<P: PathFinder> Sim<P> {
    pub(crate) fn new(config: SimConfig, grid: Grid, agents: Vec<Agent>, path_finder: P) -> Self {
        let mut sim = Self {
            clock: config.make_clock(),
            config,
            grid,
            agents,
            index: Map::default(),
            rngs: Map::default(),
            path_finder,
            status: SimStatus::Idle,
            ticks_without_movement: 0,
            evacuated: 0,
            events: Vec::new(),
        };
        sim.rebuild_index();
        sim
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Live agents in processing order.
    #[inline]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&i| &self.agents[i])
    }

    #[inline]
    pub fn status(&self) -> SimStatus {
        self.status
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.agents.len()
    }

    /// Agents evacuated since the last start.
    #[inline]
    pub fn evacuated_count(&self) -> usize {
        self.evacuated
    }

    #[inline]
    pub fn ticks_without_movement(&self) -> u32 {
        self.ticks_without_movement
    }

    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed_secs()
    }

    /// Events queued since the last dispatch or drain.
    pub fn pending_events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Take the queued events without notifying anyone.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only view of every live agent, for renderers.
    pub fn snapshot(&self) -> Vec<AgentView> {
        self.agents
            .iter()
            .map(|a| AgentView {
                id: a.id(),
                position: a.position(),
                state: a.state(),
                behavior: a.behavior(),
            })
            .collect()
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Move from `Idle` to `Running`.
    ///
    /// Refuses with [`SimError::NoAgents`] or [`SimError::NoExit`] when there
    /// is nothing to simulate; the simulation stays `Idle`.
    pub fn start(&mut self) -> SimResult<()> {
        if self.status != SimStatus::Idle {
            return Err(self.invalid("start"));
        }
        if self.agents.is_empty() {
            warn!("refusing to start: no agents");
            return Err(SimError::NoAgents);
        }
        if !self.grid.has_exit() {
            warn!("refusing to start: the grid has no exit");
            return Err(SimError::NoExit);
        }

        self.clock.reset();
        self.ticks_without_movement = 0;
        self.evacuated = 0;
        let seed = self.config.seed;
        self.rngs = self
            .agents
            .iter()
            .map(|a| (a.id(), AgentRng::new(seed, a.id())))
            .collect();
        self.status = SimStatus::Running;
        self.events.push(SimEvent::Started {
            agent_count: self.agents.len(),
            rows: self.grid.rows(),
            cols: self.grid.cols(),
        });
        info!(
            agents = self.agents.len(),
            rows = self.grid.rows(),
            cols = self.grid.cols(),
            "simulation started"
        );
        Ok(())
    }

    /// Stop advancing ticks.  All state is kept for [`resume`](Self::resume).
    pub fn pause(&mut self) -> SimResult<()> {
        if self.status != SimStatus::Running {
            return Err(self.invalid("pause"));
        }
        self.status = SimStatus::Paused;
        self.events.push(SimEvent::Paused { tick: self.clock.current_tick });
        info!(tick = self.clock.current_tick.0, "simulation paused");
        Ok(())
    }

    pub fn resume(&mut self) -> SimResult<()> {
        if self.status != SimStatus::Paused {
            return Err(self.invalid("resume"));
        }
        self.status = SimStatus::Running;
        self.events.push(SimEvent::Resumed { tick: self.clock.current_tick });
        info!(tick = self.clock.current_tick.0, "simulation resumed");
        Ok(())
    }

    /// Discard every agent, rewind the clock and clear the grid back to
    /// floor (same dimensions).  Always allowed.
    pub fn reset(&mut self) {
        self.agents.clear();
        self.index.clear();
        self.rngs.clear();
        self.clock.reset();
        self.grid.clear();
        self.status = SimStatus::Idle;
        self.ticks_without_movement = 0;
        self.evacuated = 0;
        self.events.push(SimEvent::Reset);
        info!("simulation reset");
    }

    /// Replace grid and agents.  Not allowed while running or paused.
    pub fn load_scenario(&mut self, scenario: Scenario) -> SimResult<()> {
        if matches!(self.status, SimStatus::Running | SimStatus::Paused) {
            return Err(self.invalid("load a scenario"));
        }
        let mut index = Map::default();
        for (i, agent) in scenario.agents.iter().enumerate() {
            if index.insert(agent.id(), i).is_some() {
                return Err(EvacError::DuplicateAgent(agent.id()).into());
            }
        }
        self.grid = scenario.grid;
        self.agents = scenario.agents;
        self.index = index;
        self.rngs.clear();
        self.clock.reset();
        self.status = SimStatus::Idle;
        Ok(())
    }

    /// Mutate the grid.  Refused while running; allowed while paused so
    /// blocked agents can be freed.
    pub fn edit_grid<R>(&mut self, edit: impl FnOnce(&mut Grid) -> R) -> SimResult<R> {
        if self.status.is_running() {
            return Err(self.invalid("edit the grid"));
        }
        Ok(edit(&mut self.grid))
    }

    pub fn set_cell(&mut self, pos: Position, kind: CellKind) -> SimResult<()> {
        self.edit_grid(|g| g.set_cell(pos, kind))
    }

    /// Append an agent to the end of the processing order.
    pub fn add_agent(&mut self, agent: Agent) -> SimResult<()> {
        if matches!(self.status, SimStatus::Running | SimStatus::Completed(_)) {
            return Err(self.invalid("add an agent"));
        }
        let id = agent.id();
        if self.index.contains_key(&id) {
            return Err(EvacError::DuplicateAgent(id).into());
        }
        if self.status == SimStatus::Paused {
            self.rngs.insert(id, AgentRng::new(self.config.seed, id));
        }
        self.index.insert(id, self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Process one tick, then hand the queued events to `observer`.
    pub fn tick<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<SimStatus> {
        if !self.status.is_running() {
            return Err(self.invalid("tick"));
        }
        self.process_tick();
        self.dispatch(observer);
        Ok(self.status)
    }

    /// Run until completion, starting or resuming first if needed.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<SimOutcome> {
        match self.status {
            SimStatus::Idle => self.start()?,
            SimStatus::Paused => self.resume()?,
            SimStatus::Running => {}
            SimStatus::Completed(outcome) => return Ok(outcome),
        }
        loop {
            if let SimStatus::Completed(outcome) = self.tick(observer)? {
                return Ok(outcome);
            }
        }
    }

    /// Run at most `n` ticks, stopping early on completion.  Starts the
    /// simulation if it is idle.
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<SimStatus> {
        if self.status == SimStatus::Idle {
            self.start()?;
        }
        for _ in 0..n {
            if self.status.outcome().is_some() {
                break;
            }
            self.tick(observer)?;
        }
        Ok(self.status)
    }

    /// Hand every queued event to `observer`, oldest first.
    pub fn dispatch<O: SimObserver>(&mut self, observer: &mut O) {
        let events = std::mem::take(&mut self.events);
        for event in &events {
            observer.on_event(event);
            match event {
                SimEvent::Started { agent_count, .. } => {
                    observer.on_sim_start(&self.grid, *agent_count);
                }
                SimEvent::TickCompleted { tick, elapsed_secs, .. } => {
                    observer.on_tick_end(*tick, *elapsed_secs, &self.agents);
                }
                SimEvent::Finished { outcome, tick, elapsed_secs } => {
                    observer.on_sim_end(*outcome, *tick, *elapsed_secs);
                }
                _ => {}
            }
        }
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick(&mut self) {
        self.clock.advance();
        let tick = self.clock.current_tick;
        let elapsed = self.clock.elapsed_secs();
        let dt = self.config.tick_duration_secs;

        let mut occupancy = Occupancy::default();
        for agent in self.agents.iter().filter(|a| !a.is_evacuated()) {
            occupy(&mut occupancy, agent.position());
        }

        let mut moved = false;
        for i in 0..self.agents.len() {
            moved |= self.agent_turn(i, elapsed, dt, &mut occupancy);
        }
        self.collect_notices();

        // Filter-rebuild the live list; indices stay valid until here.
        let live_before = self.agents.len();
        for agent in self.agents.iter().filter(|a| a.is_evacuated()) {
            self.rngs.remove(&agent.id());
        }
        self.agents.retain(|a| !a.is_evacuated());
        self.rebuild_index();
        debug!(
            tick = tick.0,
            evacuated = live_before - self.agents.len(),
            live = self.agents.len(),
            moved,
            "tick processed"
        );

        let mut outcome = None;
        if self.agents.is_empty() {
            outcome = Some(SimOutcome::Evacuated);
        } else if moved {
            self.ticks_without_movement = 0;
        } else {
            self.ticks_without_movement += 1;
            if self.ticks_without_movement >= self.config.max_ticks_without_movement {
                warn!(
                    ticks = self.ticks_without_movement,
                    remaining = self.agents.len(),
                    "no agent moved; marking the rest blocked"
                );
                for agent in &mut self.agents {
                    agent.set_state(AgentState::Blocked);
                }
                self.collect_notices();
                outcome = Some(SimOutcome::Stagnated);
            }
        }
        if outcome.is_none() && self.config.max_ticks.is_some_and(|max| tick.0 >= max) {
            outcome = Some(SimOutcome::TickLimit);
        }

        self.events.push(SimEvent::TickCompleted {
            tick,
            elapsed_secs: elapsed,
            live: self.agents.len(),
            moved,
        });
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
    }

    /// One agent's turn.  Returns `true` if it changed cell.
    fn agent_turn(&mut self, i: usize, elapsed: f64, dt: f64, occupancy: &mut Occupancy) -> bool {
        let id = self.agents[i].id();
        let pos = self.agents[i].position();

        if self.agents[i].is_evacuated() {
            self.record_evacuation(i, pos, elapsed);
            return false;
        }
        if self.grid.is_exit(pos) {
            self.evacuate(i, pos, elapsed, occupancy);
            return false;
        }
        let Some(exit) = self.grid.nearest_exit(pos) else {
            let agent = &mut self.agents[i];
            agent.clear_route();
            agent.set_state(AgentState::Blocked);
            warn!(agent = %id, "no exit on the grid");
            return false;
        };

        if self.agents[i].as_rescuer().is_some() {
            self.maintain_assist(i);
        }

        // Exit cells never conflict: any number of agents may pass per tick.
        let next = self.path_finder.next_step(&self.grid, pos, exit);
        let agent = &mut self.agents[i];
        agent.clear_route();
        if next == pos {
            agent.set_state(AgentState::Blocked);
            debug!(agent = %id, %pos, %exit, "no path to exit");
        } else if !self.grid.is_exit(next) && occupancy.get(&next).is_some_and(|&n| n > 0) {
            self.events.push(SimEvent::Collision { agent: id, at: next });
            agent.on_obstacle();
            debug!(agent = %id, at = %next, "collision");
        } else {
            if matches!(agent.state(), AgentState::Normal | AgentState::Blocked) {
                agent.set_state(AgentState::Evacuating);
            }
            agent.queue_step(next, self.grid.is_exit(next));
        }

        let seed = self.config.seed;
        let rng = self.rngs.entry(id).or_insert_with(|| AgentRng::new(seed, id));
        self.agents[i].update(dt, rng);

        let now_at = self.agents[i].position();
        let moved = now_at != pos;
        if moved {
            self.agents[i].core_mut().steps += 1;
            vacate(occupancy, pos);
            occupy(occupancy, now_at);
            self.events.push(SimEvent::Moved {
                agent: id,
                kind: self.agents[i].kind(),
                from: pos,
                to: now_at,
            });
            self.escort(i, pos, now_at, occupancy);
        }

        if self.agents[i].is_evacuated() || self.grid.is_exit(now_at) {
            self.evacuate(i, now_at, elapsed, occupancy);
        }
        moved
    }

    /// Resolve a rescuer's assist by id, clearing it if the evacuee is gone,
    /// and look for someone to help when free.
    fn maintain_assist(&mut self, i: usize) {
        let Some(rescuer) = self.agents[i].as_rescuer() else {
            return;
        };
        let rescuer_id = rescuer.core.id;

        if let Some(target) = rescuer.assisting() {
            let alive = self
                .index
                .get(&target)
                .map(|&j| &self.agents[j])
                .is_some_and(|a| a.as_evacuee().is_some() && !a.is_evacuated());
            if alive {
                return;
            }
            if let Some(r) = self.agents[i].as_rescuer_mut() {
                r.drop_assist();
            }
            warn!(rescuer = %rescuer_id, evacuee = %target, "assisted evacuee is gone; clearing assist");
        }

        let found = self.agents[i]
            .as_rescuer()
            .and_then(|r| r.scan_for_needy(&self.agents));
        if let (Some(target), Some(r)) = (found, self.agents[i].as_rescuer_mut()) {
            r.assist(target);
            debug!(rescuer = %rescuer_id, evacuee = %target, "rescuer assisting");
        }
    }

    /// Carry an assisted evacuee along when it stood on or next to the
    /// rescuer's previous cell.
    fn escort(&mut self, i: usize, from: Position, to: Position, occupancy: &mut Occupancy) {
        let Some(target) = self.agents[i].as_rescuer().and_then(|r| r.assisting()) else {
            return;
        };
        let Some(&j) = self.index.get(&target) else {
            return;
        };
        let evacuee = &mut self.agents[j];
        let at = evacuee.position();
        if evacuee.is_evacuated() || at == to || at.manhattan(from) > 1 {
            return;
        }
        evacuee.set_position(to);
        vacate(occupancy, at);
        occupy(occupancy, to);
        self.events.push(SimEvent::Moved {
            agent: target,
            kind: AgentKind::Evacuee,
            from: at,
            to,
        });
    }

    /// Mark agent `i` evacuated through `exit`.  A rescuer releases its
    /// evacuee first.
    fn evacuate(&mut self, i: usize, exit: Position, elapsed: f64, occupancy: &mut Occupancy) {
        if let Some(released) = self.agents[i].as_rescuer_mut().and_then(|r| r.release()) {
            if let Some(evacuee) = self
                .index
                .get(&released)
                .and_then(|&j| self.agents[j].as_evacuee_mut())
            {
                evacuee.calm(RELEASE_CALM);
            }
        }
        self.agents[i].clear_route();
        self.agents[i].set_state(AgentState::Evacuated);
        vacate(occupancy, exit);
        self.record_evacuation(i, exit, elapsed);
    }

    fn record_evacuation(&mut self, i: usize, exit: Position, elapsed: f64) {
        let agent = &self.agents[i];
        let evacuee = agent.as_evacuee();
        let event = EvacuationEvent {
            agent_id: agent.id(),
            kind: agent.kind(),
            exit,
            elapsed_secs: elapsed,
            steps: agent.steps(),
            panicked: evacuee.is_some_and(|e| e.is_panicked()),
            reduced_mobility: evacuee.is_some_and(|e| e.reduced_mobility()),
        };
        self.evacuated += 1;
        debug!(agent = %event.agent_id, %exit, elapsed, steps = event.steps, "agent evacuated");
        self.events.push(SimEvent::Evacuated(event));
    }

    /// Move every agent's pending notices into the event queue.
    fn collect_notices(&mut self) {
        for agent in self.agents.iter_mut() {
            let (id, kind) = (agent.id(), agent.kind());
            for notice in agent.take_notices() {
                self.events.push(SimEvent::Agent { agent: id, kind, notice });
            }
        }
    }

    fn finish(&mut self, outcome: SimOutcome) {
        self.status = SimStatus::Completed(outcome);
        let tick = self.clock.current_tick;
        let elapsed_secs = self.clock.elapsed_secs();
        self.events.push(SimEvent::Finished { outcome, tick, elapsed_secs });
        info!(
            %outcome,
            tick = tick.0,
            elapsed_secs,
            evacuated = self.evacuated,
            remaining = self.agents.len(),
            "simulation finished"
        );
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id(), i))
            .collect();
    }

    fn invalid(&self, action: &'static str) -> SimError {
        SimError::InvalidState { action, status: self.status }
    }
}

#[inline]
fn occupy(occupancy: &mut Occupancy, pos: Position) {
    *occupancy.entry(pos).or_insert(0) += 1;
}

#[inline]
fn vacate(occupancy: &mut Occupancy, pos: Position) {
    if let Some(n) = occupancy.get_mut(&pos) {
        *n = n.saturating_sub(1);
    }
}
