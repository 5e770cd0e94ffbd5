//! `evac-spatial`: the occupancy grid and next-step path finding.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`grid`]    | `Grid`, `CellKind`                                          |
//! | [`path`]    | `PathFinder` trait, `BfsPathFinder`, `bfs_distance`         |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod grid;
pub mod path;


pub use error::{SpatialError, SpatialResult};
pub use grid::{CellKind, Grid};
pub use path::{bfs_distance, BfsPathFinder, PathFinder};
