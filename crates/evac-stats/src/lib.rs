//! `evac-stats`: evacuation statistics and reports for the `evac` simulator.
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | `stats`     | [`SimulationStats`], [`ExitStats`], [`StatsConfig`]         |
//! | `collector` | [`StatsCollector`]: `record_*` calls and aggregation        |
//! | `report`    | text / JSON renderers, [`ReportFormat`], [`export_report`]  |
//! | `csv`       | tabular renderer and its reader                             |
//! | `observer`  | [`StatsObserver`], which implements `evac_sim::SimObserver` |
//!
//! # Usage
//!
//! ```rust,ignore
//! use evac_stats::{StatsObserver, StatsConfig};
//!
//! let mut obs = StatsObserver::new(StatsConfig::default()).exporting_to("report.json");
//! sim.run(&mut obs)?;
//! println!("{}", obs.collector().summary_line());
//! if let Some(e) = obs.take_error() {
//!     eprintln!("export failed: {e}");
//! }
//! ```

pub mod collector;
pub mod csv;
pub mod error;
pub mod observer;
pub mod report;
pub mod stats;


pub use crate::csv::{parse_csv_metrics, render_csv};
pub use collector::StatsCollector;
pub use error::{StatsError, StatsResult};
pub use observer::StatsObserver;
pub use report::{export_report, render, render_json, render_text, ReportFormat};
pub use stats::{ExitStats, SimulationStats, StatsConfig};
