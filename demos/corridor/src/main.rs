//! corridor: runs one evacuation scenario end to end and reports on it.
//!
//! ```text
//! corridor [SCENARIO.json] [REPORT.{txt,csv,json}]
//! ```
//!
//! Without a scenario path a two-room office is generated: a crowd placed
//! with `AgentFactory::evacuee_group`, a few prototype agents and one
//! rescuer, all funnelling through a single door.  Set `RUST_LOG=debug` to
//! see every evacuation and collision.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use evac_agent::{Agent, AgentFactory};
use evac_core::{Position, SimConfig, SimRng, Tick};
use evac_sim::{Scenario, SimBuilder, SimObserver};
use evac_spatial::{CellKind, Grid};
use evac_stats::{StatsConfig, StatsObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:                u64   = 42;
const ROWS:                usize = 16;
const COLS:                usize = 24;
const CROWD_SIZE:          usize = 35;
const PROGRESS_EVERY:      u64   = 10;
const DEFAULT_REPORT_PATH: &str  = "evacuation_report.txt";

// ── Generated scenario ────────────────────────────────────────────────────────

/// West room and east room split by a wall at column 10 with one door.
/// Exits on the east and north walls of the east room.
fn office_grid() -> Grid {
    let mut grid = Grid::new(ROWS, COLS);
    let (rows, cols) = (ROWS as i32, COLS as i32);
    for r in 0..rows {
        for c in 0..cols {
            if r == 0 || c == 0 || r == rows - 1 || c == cols - 1 || (c == 10 && r != 8) {
                grid.set_cell(Position::new(r, c), CellKind::Wall);
            }
        }
    }
    grid.set_cell(Position::new(8, cols - 1), CellKind::Exit);
    grid.set_cell(Position::new(0, 18), CellKind::Exit);
    grid
}

fn office_scenario() -> Result<Scenario> {
    let grid = office_grid();
    let mut factory = AgentFactory::new();
    let mut rng = SimRng::new(SEED);

    let mut taken = HashSet::new();
    let mut agents: Vec<Agent> = factory
        .evacuee_group(CROWD_SIZE, Position::new(8, 5), 35, 5.0, &mut rng)
        .into_iter()
        .filter(|a| grid.is_transitable(a.position()) && taken.insert(a.position()))
        .collect();

    for (name, row, col) in [("elderly", 2, 2), ("reduced_mobility", 13, 2), ("adult", 3, 15)] {
        let pos = Position::new(row, col);
        if taken.insert(pos) {
            agents.push(factory.from_prototype(name, pos)?);
        }
    }
    agents.push(factory.rescuer(Position::new(8, 14)));

    Ok(Scenario::new(grid, agents))
}

// ── Progress printer ──────────────────────────────────────────────────────────

struct ProgressPrinter {
    interval: u64,
}

impl SimObserver for ProgressPrinter {
    fn on_tick_end(&mut self, tick: Tick, elapsed_secs: f64, agents: &[Agent]) {
        if tick.0 % self.interval == 0 {
            println!("  {tick}  t={elapsed_secs:>6.1}s  inside={}", agents.len());
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let scenario_path = args.next().map(PathBuf::from);
    let report_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH));
    if args.next().is_some() {
        bail!("usage: corridor [SCENARIO.json] [REPORT.{{txt,csv,json}}]");
    }

    println!("=== corridor: evacuation simulation ===");

    // 1. Scenario.
    let scenario = match &scenario_path {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => office_scenario()?,
    };
    println!(
        "Grid: {}x{}  |  exits: {}  |  agents: {}",
        scenario.grid.rows(),
        scenario.grid.cols(),
        scenario.grid.exits().count(),
        scenario.agents.len()
    );

    // 2. Simulation.
    let config = SimConfig { seed: SEED, ..SimConfig::default() };
    println!("Config: {}", serde_json::to_string(&config)?);
    let mut sim = SimBuilder::new(config).scenario(scenario).build()?;

    // 3. Run.
    let stats = StatsObserver::new(StatsConfig::default()).exporting_to(&report_path);
    let mut observers = (stats, ProgressPrinter { interval: PROGRESS_EVERY });
    let started = Instant::now();
    let outcome = sim.run(&mut observers)?;
    let wall = started.elapsed();
    info!(%outcome, ticks = sim.current_tick().0, ?wall, "run complete");

    // 4. Report.
    let (mut stats, _) = observers;
    let collector = stats.collector();
    println!();
    println!("{}", evac_stats::render_text(collector.stats()));
    println!("{}", collector.summary_line());
    println!("Outcome: {outcome} after {} ({:.1?} wall time)", sim.current_tick(), wall);

    check_export(&mut stats, &report_path)?;
    println!("Report written to {}", report_path.display());
    Ok(())
}

/// Surface an export failure stored by the observer as the run's error.
fn check_export(stats: &mut StatsObserver, path: &Path) -> Result<()> {
    if let Some(e) = stats.take_error() {
        bail!("report export to {} failed: {e}", path.display());
    }
    Ok(())
}
