//! Simulation observer trait for progress reporting and data collection.

use evac_agent::Agent;
use evac_core::Tick;
use evac_spatial::Grid;

use crate::{SimEvent, SimOutcome};

/// Callbacks invoked by [`Sim::tick`][crate::Sim::tick] after each tick.
///
/// Every queued [`SimEvent`] is passed to [`on_event`](Self::on_event) in
/// emission order.  The lifecycle events additionally trigger their own
/// hook right after.  All methods default to no-ops.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, tick: Tick, _elapsed: f64, agents: &[Agent]) {
///         if tick.0 % self.interval == 0 {
///             println!("{tick}: {} agents still inside", agents.len());
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once, for the `Started` event.
    fn on_sim_start(&mut self, _grid: &Grid, _agent_count: usize) {}

    /// Called for every event.
    fn on_event(&mut self, _event: &SimEvent) {}

    /// Called at the end of each tick with the agents still inside.
    fn on_tick_end(&mut self, _tick: Tick, _elapsed_secs: f64, _agents: &[Agent]) {}

    /// Called once when the run completes.
    fn on_sim_end(&mut self, _outcome: SimOutcome, _tick: Tick, _elapsed_secs: f64) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Forward every callback to each observer in turn.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn on_sim_start(&mut self, grid: &Grid, agent_count: usize) {
        self.0.on_sim_start(grid, agent_count);
        self.1.on_sim_start(grid, agent_count);
    }

    fn on_event(&mut self, event: &SimEvent) {
        self.0.on_event(event);
        self.1.on_event(event);
    }

    fn on_tick_end(&mut self, tick: Tick, elapsed_secs: f64, agents: &[Agent]) {
        self.0.on_tick_end(tick, elapsed_secs, agents);
        self.1.on_tick_end(tick, elapsed_secs, agents);
    }

    fn on_sim_end(&mut self, outcome: SimOutcome, tick: Tick, elapsed_secs: f64) {
        self.0.on_sim_end(outcome, tick, elapsed_secs);
        self.1.on_sim_end(outcome, tick, elapsed_secs);
    }
}
