//! The aggregate statistics struct and its configuration.

use std::collections::BTreeMap;

use evac_core::Position;
use evac_sim::SimOutcome;

/// Collisions a single cell may absorb before it counts as a bottleneck.
pub const DEFAULT_BOTTLENECK_THRESHOLD: u32 = 5;

/// Tunables for [`StatsCollector`][crate::StatsCollector].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatsConfig {
    /// A cell is flagged once its collision count exceeds this.
    pub bottleneck_threshold: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { bottleneck_threshold: DEFAULT_BOTTLENECK_THRESHOLD }
    }
}

/// Evacuations through one exit cell.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ExitStats {
    pub evacuated: u32,
    /// Mean evacuation time through this exit.  Filled by
    /// [`compute_aggregates`][crate::StatsCollector::compute_aggregates].
    pub avg_time_secs: f64,
}

/// Everything the reports show.
///
/// Counters are updated incrementally as events arrive; the derived fields
/// (times, rate, distance, density, per-exit averages) are only valid after
/// [`StatsCollector::compute_aggregates`][crate::StatsCollector::compute_aggregates].
/// All three report formats render from this struct alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationStats {
    // ── Timing ────────────────────────────────────────────────────────────
    pub total_time_secs: f64,
    pub avg_evacuation_secs: f64,
    pub min_evacuation_secs: f64,
    pub max_evacuation_secs: f64,

    // ── Counts ────────────────────────────────────────────────────────────
    pub total_agents: u32,
    pub total_evacuated: u32,
    pub evacuees_evacuated: u32,
    pub rescuers_evacuated: u32,
    /// Agents still inside the building.
    pub in_process: u32,

    // ── Per exit, keyed by the exit cell ──────────────────────────────────
    pub exits: BTreeMap<Position, ExitStats>,

    // ── Behaviour ─────────────────────────────────────────────────────────
    /// Evacuees that panicked at any point in the run.
    pub panicked: u32,
    /// Reduced-mobility evacuees in the run, evacuated or not.
    pub reduced_mobility: u32,
    /// Evacuees still inside and panicked as of the last tick.
    pub panicked_inside: u32,
    pub reduced_mobility_inside: u32,
    /// Evacuees released by a rescuer at an exit.
    pub rescued: u32,

    // ── Efficiency ────────────────────────────────────────────────────────
    /// Evacuated agents per simulated second.
    pub evacuation_rate: f64,
    /// Mean Euclidean path length of evacuated agents, in cells.
    pub avg_distance: f64,
    /// Agents per cell of grid area.
    pub density: f64,
    pub total_collisions: u32,
    /// Flagged cells, in the order they crossed the threshold.
    pub bottlenecks: Vec<Position>,

    /// Occurrences per event kind (`"movement"`, `"collision"`, ...).
    pub event_counts: BTreeMap<String, u32>,

    /// How the run ended, once it has.
    pub outcome: Option<SimOutcome>,
}

impl SimulationStats {
    /// Evacuated share of all agents, in percent.
    pub fn evacuated_percent(&self) -> f64 {
        if self.total_agents == 0 {
            0.0
        } else {
            f64::from(self.total_evacuated) * 100.0 / f64::from(self.total_agents)
        }
    }

    pub fn exit_count(&self, exit: Position) -> u32 {
        self.exits.get(&exit).map_or(0, |e| e.evacuated)
    }

    pub fn exit_avg_time(&self, exit: Position) -> f64 {
        self.exits.get(&exit).map_or(0.0, |e| e.avg_time_secs)
    }
}

/// `83.5` → `"1m 23.5s"`, `9.0` → `"9.00s"`.
pub fn format_duration(secs: f64) -> String {
    let mins = (secs / 60.0).floor();
    if mins >= 1.0 {
        format!("{}m {:.1}s", mins as u64, secs - mins * 60.0)
    } else {
        format!("{secs:.2}s")
    }
}
