//! Report rendering and export.
//!
//! | Format                 | Renderer          | Chosen for paths ending in |
//! |------------------------|-------------------|----------------------------|
//! | [`ReportFormat::Text`] | [`render_text`]   | anything else              |
//! | [`ReportFormat::Csv`]  | [`render_csv`]    | `.csv`                     |
//! | [`ReportFormat::Json`] | [`render_json`]   | `.json`                    |
//!
//! Every renderer reads only a [`SimulationStats`]; call
//! [`StatsCollector::compute_aggregates`][crate::StatsCollector::compute_aggregates]
//! first.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::csv::render_csv;
use crate::stats::{format_duration, SimulationStats};
use crate::StatsResult;

const RULE: &str = "===============================================================";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Csv,
    Json,
}

impl ReportFormat {
    /// Pick a format from the destination's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => ReportFormat::Csv,
            Some("json") => ReportFormat::Json,
            _ => ReportFormat::Text,
        }
    }
}

pub fn render(stats: &SimulationStats, format: ReportFormat) -> StatsResult<String> {
    match format {
        ReportFormat::Text => Ok(render_text(stats)),
        ReportFormat::Csv => render_csv(stats),
        ReportFormat::Json => render_json(stats),
    }
}

/// Write `stats` to `path` in the format its extension selects.
///
/// Fails with [`StatsError::Io`][crate::StatsError::Io] when the destination
/// is not writable.
pub fn export_report(stats: &SimulationStats, path: impl AsRef<Path>) -> StatsResult<()> {
    let path = path.as_ref();
    let format = ReportFormat::from_path(path);
    let body = render(stats, format)?;
    fs::write(path, body)?;
    info!(path = %path.display(), ?format, "report exported");
    Ok(())
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// Human-readable report.
pub fn render_text(s: &SimulationStats) -> String {
    // `write!` into a String cannot fail.
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "           EVACUATION SIMULATION STATISTICS REPORT");
    let _ = writeln!(out, "{RULE}\n");

    let _ = writeln!(out, "--- General ---");
    let _ = writeln!(out, "Total agents:                {}", s.total_agents);
    let _ = write!(out, "Agents evacuated:            {}", s.total_evacuated);
    if s.total_agents > 0 {
        let _ = write!(out, " ({:.1}%)", s.evacuated_percent());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  - Evacuees:                {}", s.evacuees_evacuated);
    let _ = writeln!(out, "  - Rescuers:                {}", s.rescuers_evacuated);
    let _ = writeln!(out, "Agents still inside:         {}", s.in_process);
    if let Some(outcome) = s.outcome {
        let _ = writeln!(out, "Outcome:                     {outcome}");
    }
    if s.total_evacuated == 0 && s.total_agents > 0 {
        let _ = writeln!(out, "\nWARNING: no agent managed to evacuate.");
        let _ = writeln!(out, "  Check that the grid has an exit and that every agent can reach one.");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Timing ---");
    let _ = writeln!(out, "Total simulated time:        {}", format_duration(s.total_time_secs));
    if s.total_evacuated > 0 {
        let _ = writeln!(out, "Mean evacuation time:        {}", format_duration(s.avg_evacuation_secs));
        let _ = writeln!(out, "Fastest evacuation:          {}", format_duration(s.min_evacuation_secs));
        let _ = writeln!(out, "Slowest evacuation:          {}", format_duration(s.max_evacuation_secs));
        let _ = writeln!(out, "Evacuation rate:             {:.2} agents/s", s.evacuation_rate);
    } else {
        let _ = writeln!(out, "(no completed evacuations)");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Exits ---");
    if s.exits.is_empty() {
        let _ = writeln!(out, "(no exit was used)");
    }
    for (exit, e) in &s.exits {
        let _ = writeln!(
            out,
            "Exit ({exit}): {} agents (mean time {})",
            e.evacuated,
            format_duration(e.avg_time_secs)
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Behaviour ---");
    let _ = writeln!(out, "Panicked evacuees:           {}", s.panicked);
    let _ = writeln!(out, "Reduced mobility:            {}", s.reduced_mobility);
    let _ = writeln!(out, "Rescued by rescuers:         {}", s.rescued);
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Efficiency ---");
    if s.total_evacuated > 0 {
        let _ = writeln!(out, "Mean distance travelled:     {:.2} cells", s.avg_distance);
    } else {
        let _ = writeln!(out, "Mean distance travelled:     n/a");
    }
    let _ = writeln!(out, "Total collisions:            {}", s.total_collisions);
    let _ = writeln!(out, "Density:                     {:.4} agents/cell", s.density);
    let _ = writeln!(out, "Bottlenecks:                 {}", s.bottlenecks.len());
    if !s.bottlenecks.is_empty() {
        let cells: Vec<String> = s.bottlenecks.iter().map(|p| format!("({p})")).collect();
        let _ = writeln!(out, "  at {}", cells.join(", "));
    }
    let _ = writeln!(out, "\n{RULE}");
    out
}

// ── JSON ──────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonReport {
    #[serde(rename = "simulacion")]
    simulation: JsonSimulation,
    #[serde(rename = "tiempos")]
    times: JsonTimes,
    #[serde(rename = "comportamiento")]
    behaviour: JsonBehaviour,
    #[serde(rename = "eficiencia")]
    efficiency: JsonEfficiency,
    #[serde(rename = "salidas")]
    exits: Vec<JsonExit>,
}

#[derive(Serialize)]
struct JsonSimulation {
    #[serde(rename = "totalAgentes")]
    total_agents: u32,
    #[serde(rename = "totalEvacuados")]
    total_evacuated: u32,
    #[serde(rename = "personasEvacuadas")]
    evacuees_evacuated: u32,
    #[serde(rename = "rescatistasEvacuados")]
    rescuers_evacuated: u32,
    #[serde(rename = "enProceso")]
    in_process: u32,
    #[serde(rename = "resultado", skip_serializing_if = "Option::is_none")]
    outcome: Option<String>,
}

#[derive(Serialize)]
struct JsonTimes {
    total: f64,
    #[serde(rename = "promedioEvacuacion")]
    average: f64,
    #[serde(rename = "minimo")]
    min: f64,
    #[serde(rename = "maximo")]
    max: f64,
    #[serde(rename = "tasaEvacuacion")]
    rate: f64,
}

#[derive(Serialize)]
struct JsonBehaviour {
    #[serde(rename = "personasConPanico")]
    panicked: u32,
    #[serde(rename = "movilidadReducida")]
    reduced_mobility: u32,
    #[serde(rename = "personasRescatadas")]
    rescued: u32,
}

#[derive(Serialize)]
struct JsonEfficiency {
    #[serde(rename = "distanciaPromedio")]
    avg_distance: f64,
    #[serde(rename = "colisionesTotales")]
    total_collisions: u32,
    #[serde(rename = "densidadPromedio")]
    density: f64,
    #[serde(rename = "cuellosBotella")]
    bottlenecks: usize,
}

#[derive(Serialize)]
struct JsonExit {
    #[serde(rename = "ubicacion")]
    location: String,
    #[serde(rename = "personas")]
    evacuated: u32,
    #[serde(rename = "tiempoPromedio")]
    avg_time: f64,
}

/// Structured report, pretty-printed.
pub fn render_json(s: &SimulationStats) -> StatsResult<String> {
    let report = JsonReport {
        simulation: JsonSimulation {
            total_agents: s.total_agents,
            total_evacuated: s.total_evacuated,
            evacuees_evacuated: s.evacuees_evacuated,
            rescuers_evacuated: s.rescuers_evacuated,
            in_process: s.in_process,
            outcome: s.outcome.map(|o| o.to_string()),
        },
        times: JsonTimes {
            total: s.total_time_secs,
            average: s.avg_evacuation_secs,
            min: s.min_evacuation_secs,
            max: s.max_evacuation_secs,
            rate: s.evacuation_rate,
        },
        behaviour: JsonBehaviour {
            panicked: s.panicked,
            reduced_mobility: s.reduced_mobility,
            rescued: s.rescued,
        },
        efficiency: JsonEfficiency {
            avg_distance: s.avg_distance,
            total_collisions: s.total_collisions,
            density: s.density,
            bottlenecks: s.bottlenecks.len(),
        },
        exits: s
            .exits
            .iter()
            .map(|(exit, e)| JsonExit {
                location: exit.to_string(),
                evacuated: e.evacuated,
                avg_time: e.avg_time_secs,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
