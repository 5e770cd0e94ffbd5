//! `evac-sim`: tick loop orchestrator for the `evac` evacuation simulator.
//!
//! # Tick loop
//!
//! ```text
//! clock.advance()
//! for agent in live agents, in storage order:
//!   ① already evacuated     → record evacuation
//!   ② standing on an exit   → evacuate, record EvacuationEvent
//!   ③ no exit on the grid   → Blocked, skip
//!   ④ rescuer               → drop stale assist / scan for someone to help
//!   ⑤ next_step toward the nearest exit
//!        occupied target    → Collision event, agent.on_obstacle()
//!        free target        → queue the step
//!        no path            → Blocked
//!   ⑥ agent.update(dt)      → movement integrator + behaviour
//!   ⑦ changed cell          → Moved event, escort assisted evacuee
//!   ⑧ on an exit now        → evacuate within the same tick
//! rebuild the live list without evacuated agents
//! stagnation / completion checks, TickCompleted event
//! ```
//!
//! Events are queued while the tick runs and only handed to a
//! [`SimObserver`] once every agent has been processed, so observers always
//! see a consistent per-tick snapshot.
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                  |
//! |-----------|---------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for the per-tick indexes.     |
//! | `serde`   | `Serialize`/`Deserialize` on events and config.         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use evac_core::SimConfig;
//! use evac_sim::{NoopObserver, Scenario, SimBuilder};
//!
//! let scenario = Scenario::load("office.json")?;
//! let mut sim = SimBuilder::new(SimConfig::default())
//!     .scenario(scenario)
//!     .build()?;
//! let outcome = sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod observer;
pub mod scenario;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{ScenarioError, SimError, SimResult};
pub use event::{AgentView, EvacuationEvent, SimEvent, SimOutcome};
pub use observer::{NoopObserver, SimObserver};
pub use scenario::{AgentRecord, Scenario, ScenarioDocument};
pub use sim::{Sim, SimStatus};
