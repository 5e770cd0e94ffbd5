//! `StatsCollector`: accumulates simulation events into [`SimulationStats`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use evac_agent::{Agent, AgentKind, AgentState, Notice};
use evac_core::{AgentId, Position};
use evac_sim::{EvacuationEvent, SimEvent, SimOutcome};
use tracing::{debug, info};

use crate::stats::{format_duration, SimulationStats, StatsConfig};

/// Keys of [`SimulationStats::event_counts`].
pub mod event_kind {
    pub const MOVEMENT: &str = "movement";
    pub const COLLISION: &str = "collision";
    pub const EVACUATION: &str = "evacuation";
    pub const PANIC: &str = "panic";
    pub const RESCUE: &str = "rescue";
}

/// Records what the simulator reports and derives the aggregate metrics.
///
/// Feed it either through the individual `record_*` calls or wholesale with
/// [`record_event`](Self::record_event); [`StatsObserver`][crate::StatsObserver]
/// does the latter.
#[derive(Debug, Default)]
pub struct StatsCollector {
    config: StatsConfig,
    stats: SimulationStats,
    evacuations: Vec<EvacuationEvent>,
    /// Cells visited per agent, starting cell first.
    trajectories: BTreeMap<AgentId, Vec<Position>>,
    collisions_at: HashMap<Position, u32>,
    panicked_agents: BTreeSet<AgentId>,
    reduced_evacuated: u32,
    /// Summed path length of evacuated agents.
    distance_sum: f64,
    rows: usize,
    cols: usize,
    started: bool,
}

impl StatsCollector {
    pub fn new(config: StatsConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn evacuations(&self) -> &[EvacuationEvent] {
        &self.evacuations
    }

    pub fn bottlenecks(&self) -> &[Position] {
        &self.stats.bottlenecks
    }

    pub fn trajectory(&self, agent: AgentId) -> Option<&[Position]> {
        self.trajectories.get(&agent).map(Vec::as_slice)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Clear everything and begin a run of `total_agents` on a
    /// `rows x cols` grid.
    pub fn start(&mut self, total_agents: usize, rows: usize, cols: usize) {
        self.reset();
        self.stats.total_agents = total_agents as u32;
        self.stats.in_process = total_agents as u32;
        self.rows = rows;
        self.cols = cols;
        self.started = true;
        info!(agents = total_agents, rows, cols, "statistics started");
    }

    pub fn reset(&mut self) {
        self.stats = SimulationStats::default();
        self.evacuations.clear();
        self.trajectories.clear();
        self.collisions_at.clear();
        self.panicked_agents.clear();
        self.reduced_evacuated = 0;
        self.distance_sum = 0.0;
        self.started = false;
    }

    // ── Recording ─────────────────────────────────────────────────────────

    pub fn record_evacuation(&mut self, event: &EvacuationEvent) {
        match event.kind {
            AgentKind::Evacuee => self.stats.evacuees_evacuated += 1,
            AgentKind::Rescuer => self.stats.rescuers_evacuated += 1,
        }
        self.stats.total_evacuated += 1;
        self.stats.exits.entry(event.exit).or_default().evacuated += 1;
        if event.panicked {
            self.mark_panicked(event.agent_id);
        }
        if event.reduced_mobility {
            self.reduced_evacuated += 1;
            self.stats.reduced_mobility += 1;
        }
        self.bump(event_kind::EVACUATION);

        if let Some(path) = self.trajectories.get(&event.agent_id) {
            self.distance_sum += path_length(path);
        }
        self.evacuations.push(*event);
        debug!(
            agent = %event.agent_id,
            exit = %event.exit,
            evacuated = self.stats.total_evacuated,
            total = self.stats.total_agents,
            "evacuation recorded"
        );
    }

    /// Count a collision at `at`; the cell is flagged as a bottleneck the
    /// first time its count exceeds the threshold.
    pub fn record_collision(&mut self, at: Position) {
        self.stats.total_collisions += 1;
        self.bump(event_kind::COLLISION);

        let count = self.collisions_at.entry(at).or_insert(0);
        *count += 1;
        if *count > self.config.bottleneck_threshold && !self.stats.bottlenecks.contains(&at) {
            self.stats.bottlenecks.push(at);
            info!(%at, collisions = *count, "bottleneck detected");
        }
    }

    /// Extend `agent`'s trajectory.  The first movement also records the
    /// cell it started from.
    pub fn record_movement(&mut self, agent: AgentId, from: Position, to: Position) {
        let path = self.trajectories.entry(agent).or_default();
        if path.is_empty() {
            path.push(from);
        }
        path.push(to);
        self.bump(event_kind::MOVEMENT);
    }

    /// Only transitions into panic are counted as events; `panicked` counts
    /// each agent once.
    pub fn record_panic_change(&mut self, agent: AgentId, entered_panic: bool) {
        if entered_panic {
            self.mark_panicked(agent);
            self.bump(event_kind::PANIC);
        }
    }

    pub fn record_rescue(&mut self, _rescuer: AgentId, _evacuee: AgentId) {
        self.stats.rescued += 1;
        self.bump(event_kind::RESCUE);
    }

    /// Dispatch one simulator event to the matching `record_*` call.
    pub fn record_event(&mut self, event: &SimEvent) {
        match *event {
            SimEvent::Started { agent_count, rows, cols } => self.start(agent_count, rows, cols),
            SimEvent::Moved { agent, from, to, .. } => self.record_movement(agent, from, to),
            SimEvent::Collision { at, .. } => self.record_collision(at),
            SimEvent::Evacuated(ref ev) => self.record_evacuation(ev),
            SimEvent::Agent { agent, notice, .. } => match notice {
                Notice::Panicked => self.record_panic_change(agent, true),
                Notice::Calmed => self.record_panic_change(agent, false),
                Notice::Released(evacuee) => self.record_rescue(agent, evacuee),
                _ => {}
            },
            SimEvent::TickCompleted { elapsed_secs, .. } => self.update_time(elapsed_secs),
            SimEvent::Finished { outcome, elapsed_secs, .. } => {
                self.update_time(elapsed_secs);
                self.set_outcome(outcome);
            }
            SimEvent::Reset => self.reset(),
            SimEvent::Paused { .. } | SimEvent::Resumed { .. } => {}
        }
    }

    // ── Continuous updates ────────────────────────────────────────────────

    pub fn update_time(&mut self, elapsed_secs: f64) {
        self.stats.total_time_secs = elapsed_secs;
    }

    /// Recount the `*_inside` figures from the live set.  The run-wide
    /// `panicked` and `reduced_mobility` counters only ever grow.
    pub fn update_agent_states(&mut self, agents: &[Agent]) {
        let mut in_process = 0;
        let mut panicked = 0;
        let mut reduced = 0;
        for agent in agents {
            if agent.state() != AgentState::Evacuated {
                in_process += 1;
            }
            if let Some(e) = agent.as_evacuee() {
                if e.is_panicked() {
                    panicked += 1;
                    self.panicked_agents.insert(agent.id());
                }
                reduced += u32::from(e.reduced_mobility());
            }
        }
        self.stats.in_process = in_process;
        self.stats.panicked_inside = panicked;
        self.stats.reduced_mobility_inside = reduced;
        self.stats.panicked = self.panicked_agents.len() as u32;
        self.stats.reduced_mobility = self.reduced_evacuated + reduced;
    }

    pub fn set_outcome(&mut self, outcome: SimOutcome) {
        self.stats.outcome = Some(outcome);
    }

    // ── Aggregation ───────────────────────────────────────────────────────

    /// Derive timing, per-exit, rate, distance and density metrics from the
    /// recorded events.  Idempotent.
    pub fn compute_aggregates(&mut self) {
        let s = &mut self.stats;

        let area = self.rows * self.cols;
        if area > 0 {
            s.density = f64::from(s.total_agents) / area as f64;
        }
        if s.total_time_secs > 0.0 {
            s.evacuation_rate = f64::from(s.total_evacuated) / s.total_time_secs;
        }
        if s.total_evacuated > 0 {
            s.avg_distance = self.distance_sum / f64::from(s.total_evacuated);
        }

        let Some(first) = self.evacuations.first() else {
            return;
        };
        let mut min = first.elapsed_secs;
        let mut max = first.elapsed_secs;
        let mut sum = 0.0;
        let mut per_exit: BTreeMap<Position, (f64, u32)> = BTreeMap::new();
        for ev in &self.evacuations {
            min = min.min(ev.elapsed_secs);
            max = max.max(ev.elapsed_secs);
            sum += ev.elapsed_secs;
            let slot = per_exit.entry(ev.exit).or_insert((0.0, 0));
            slot.0 += ev.elapsed_secs;
            slot.1 += 1;
        }
        s.min_evacuation_secs = min;
        s.max_evacuation_secs = max;
        s.avg_evacuation_secs = sum / self.evacuations.len() as f64;
        for (exit, (total, n)) in per_exit {
            s.exits.entry(exit).or_default().avg_time_secs = total / f64::from(n);
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn exit_count(&self, exit: Position) -> u32 {
        self.stats.exit_count(exit)
    }

    pub fn exit_avg_time(&self, exit: Position) -> f64 {
        self.stats.exit_avg_time(exit)
    }

    /// Headline numbers by name.
    pub fn metrics(&self) -> BTreeMap<&'static str, f64> {
        let s = &self.stats;
        BTreeMap::from([
            ("total_agents", f64::from(s.total_agents)),
            ("evacuated", f64::from(s.total_evacuated)),
            ("total_time", s.total_time_secs),
            ("avg_time", s.avg_evacuation_secs),
            ("evacuation_rate", s.evacuation_rate),
            ("collisions", f64::from(s.total_collisions)),
            ("bottlenecks", s.bottlenecks.len() as f64),
        ])
    }

    /// One-line progress string for status bars and logs.
    pub fn summary_line(&self) -> String {
        let s = &self.stats;
        let mut line = format!(
            "Evacuated: {}/{} | Time: {}",
            s.total_evacuated,
            s.total_agents,
            format_duration(s.total_time_secs)
        );
        if s.total_evacuated > 0 {
            line.push_str(&format!(" | Rate: {:.1} p/s", s.evacuation_rate));
        } else {
            line.push_str(" | No evacuations");
        }
        line.push_str(&format!(" | Collisions: {}", s.total_collisions));
        if s.in_process > 0 {
            line.push_str(&format!(" | In process: {}", s.in_process));
        }
        line
    }

    fn mark_panicked(&mut self, agent: AgentId) {
        self.panicked_agents.insert(agent);
        self.stats.panicked = self.panicked_agents.len() as u32;
    }

    fn bump(&mut self, kind: &str) {
        *self.stats.event_counts.entry(kind.to_owned()).or_insert(0) += 1;
    }
}

fn path_length(path: &[Position]) -> f64 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}
