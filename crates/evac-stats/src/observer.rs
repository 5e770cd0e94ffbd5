//! `StatsObserver`: bridges `SimObserver` to a [`StatsCollector`].

use std::path::PathBuf;

use evac_agent::Agent;
use evac_core::Tick;
use evac_sim::{SimEvent, SimObserver, SimOutcome};
use tracing::warn;

use crate::report::export_report;
use crate::{StatsCollector, StatsConfig, StatsError};

/// A [`SimObserver`] that feeds every event into a [`StatsCollector`] and
/// finalizes the aggregates when the run ends.
///
/// With [`exporting_to`](Self::exporting_to) the report is also written at
/// the end of the run.  Export errors are stored because `SimObserver`
/// methods have no return value; check with [`take_error`](Self::take_error)
/// after `sim.run()` returns.
pub struct StatsObserver {
    collector:  StatsCollector,
    export_to:  Option<PathBuf>,
    last_error: Option<StatsError>,
}

impl StatsObserver {
    pub fn new(config: StatsConfig) -> Self {
        Self {
            collector:  StatsCollector::new(config),
            export_to:  None,
            last_error: None,
        }
    }

    /// Export the report to `path` when the run completes.  The format
    /// follows the extension.
    pub fn exporting_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_to = Some(path.into());
        self
    }

    pub fn collector(&self) -> &StatsCollector {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut StatsCollector {
        &mut self.collector
    }

    /// Take the stored export error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<StatsError> {
        self.last_error.take()
    }

    pub fn into_collector(self) -> StatsCollector {
        self.collector
    }
}

impl Default for StatsObserver {
    fn default() -> Self {
        Self::new(StatsConfig::default())
    }
}

impl SimObserver for StatsObserver {
    fn on_event(&mut self, event: &SimEvent) {
        self.collector.record_event(event);
    }

    fn on_tick_end(&mut self, _tick: Tick, _elapsed_secs: f64, agents: &[Agent]) {
        self.collector.update_agent_states(agents);
    }

    fn on_sim_end(&mut self, _outcome: SimOutcome, _tick: Tick, _elapsed_secs: f64) {
        self.collector.compute_aggregates();
        let Some(path) = &self.export_to else {
            return;
        };
        if let Err(e) = export_report(self.collector.stats(), path) {
            warn!(path = %path.display(), error = %e, "report export failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}
