//! Tabular (CSV) report.
//!
//! Two sections in one file: a `metric,value` table, then one
//! `exit,evacuated,avgTimeSecs` row per exit.  Real-valued fields are
//! written with six decimals.

use std::collections::BTreeMap;

use csv::{ReaderBuilder, WriterBuilder};

use crate::stats::SimulationStats;
use crate::StatsResult;

pub const METRIC_HEADER: [&str; 2] = ["metric", "value"];
pub const EXIT_HEADER: [&str; 3] = ["exit", "evacuated", "avgTimeSecs"];

fn real(v: f64) -> String {
    format!("{v:.6}")
}

/// `(name, value)` rows of the metric table, in output order.
fn metric_rows(s: &SimulationStats) -> Vec<(&'static str, String)> {
    vec![
        ("totalAgentes", s.total_agents.to_string()),
        ("totalEvacuados", s.total_evacuated.to_string()),
        ("personasEvacuadas", s.evacuees_evacuated.to_string()),
        ("rescatistasEvacuados", s.rescuers_evacuated.to_string()),
        ("enProceso", s.in_process.to_string()),
        ("tiempoTotal", real(s.total_time_secs)),
        ("tiempoPromedioEvacuacion", real(s.avg_evacuation_secs)),
        ("tiempoMinimo", real(s.min_evacuation_secs)),
        ("tiempoMaximo", real(s.max_evacuation_secs)),
        ("tasaEvacuacion", real(s.evacuation_rate)),
        ("personasConPanico", s.panicked.to_string()),
        ("movilidadReducida", s.reduced_mobility.to_string()),
        ("personasRescatadas", s.rescued.to_string()),
        ("colisionesTotales", s.total_collisions.to_string()),
        ("distanciaPromedio", real(s.avg_distance)),
        ("densidadPromedio", real(s.density)),
        ("cuellosBotella", s.bottlenecks.len().to_string()),
    ]
}

pub fn render_csv(s: &SimulationStats) -> StatsResult<String> {
    let mut w = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    w.write_record(METRIC_HEADER)?;
    for (name, value) in metric_rows(s) {
        w.write_record([name, value.as_str()])?;
    }

    w.write_record(EXIT_HEADER)?;
    for (exit, e) in &s.exits {
        w.write_record([
            exit.to_string(),
            e.evacuated.to_string(),
            real(e.avg_time_secs),
        ])?;
    }

    let bytes = w.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read the metric table of a rendered CSV report back into numbers.
/// Rows that are not `name,number` pairs (the exit section) are skipped.
pub fn parse_csv_metrics(text: &str) -> StatsResult<BTreeMap<String, f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut out = BTreeMap::new();
    for record in rdr.records() {
        let record = record?;
        if record.len() != 2 {
            continue;
        }
        if let Ok(value) = record[1].parse::<f64>() {
            out.insert(record[0].to_owned(), value);
        }
    }
    Ok(out)
}
