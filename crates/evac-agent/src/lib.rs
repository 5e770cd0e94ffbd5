//! `evac-agent`: agent behaviour for the `evac` evacuation simulator.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`state`]       | `AgentState`, `BehaviorKind`, `AgentKind`, `Notice`       |
//! | [`motion`]      | `Route`, `step_toward` (grid movement integrator)         |
//! | [`agent`]       | `Agent` (tagged variant), `AgentCore` (shared fields)     |
//! | [`evacuee`]     | `Evacuee`: panic, age and mobility modifiers              |
//! | [`rescuer`]     | `Rescuer`: assist relation by id, needy scan              |
//! | [`factory`]     | `AgentFactory`: id generation, prototypes, groups         |
//! | [`error`]       | `AgentError`, `AgentResult`                               |
//!
//! Agents never see the grid or each other directly.  The simulator decides
//! the next cell, queues it on the agent, and calls [`Agent::update`]; every
//! state change the agent makes is left in its notice outbox for the
//! simulator to drain.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `serde`    | Derives `Serialize`/`Deserialize` on the plain enums.      |

pub mod agent;
pub mod error;
pub mod evacuee;
pub mod factory;
pub mod motion;
pub mod rescuer;
pub mod state;


pub use agent::{Agent, AgentCore};
pub use error::{AgentError, AgentResult};
pub use evacuee::Evacuee;
pub use factory::AgentFactory;
pub use motion::{step_toward, Route};
pub use rescuer::Rescuer;
pub use state::{AgentKind, AgentState, BehaviorKind, Notice};
