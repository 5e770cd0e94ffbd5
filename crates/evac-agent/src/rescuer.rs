//! Rescuer: a fast agent that escorts evacuees needing help.
//!
//! The assist relation is an `AgentId`, never a reference.  The simulator
//! resolves it against the live set every tick and calls
//! [`Rescuer::drop_assist`] when the evacuee is gone.

use evac_core::{AgentId, Position};

use crate::{Agent, AgentCore, BehaviorKind, Notice};

pub const RESCUER_BASE_SPEED: f64 = 2.5;
/// Speed multiplier while escorting someone.
pub const CARRY_CAPACITY_FACTOR: f64 = 0.7;
/// Evacuees at or beyond this distance are ignored by the scan.
pub const SEARCH_RADIUS: f64 = 50.0;
/// Panic removed from an evacuee when released.
pub const RELEASE_CALM: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct Rescuer {
    pub core: AgentCore,
    assisting: Option<AgentId>,
    carry_capacity_factor: f64,
}

impl Rescuer {
    pub fn new(id: AgentId, position: Position) -> Self {
        Self {
            core: AgentCore::new(id, position, RESCUER_BASE_SPEED, BehaviorKind::Rescuer),
            assisting: None,
            carry_capacity_factor: CARRY_CAPACITY_FACTOR,
        }
    }

    #[inline]
    pub fn assisting(&self) -> Option<AgentId> {
        self.assisting
    }

    #[inline]
    pub fn carry_capacity_factor(&self) -> f64 {
        self.carry_capacity_factor
    }

    pub fn effective_speed(&self) -> f64 {
        match self.assisting {
            Some(_) => self.core.speed_base * self.carry_capacity_factor,
            None => self.core.speed_base,
        }
    }

    pub fn assist(&mut self, evacuee: AgentId) {
        self.assisting = Some(evacuee);
        self.core.notify(Notice::Assisting(evacuee));
    }

    /// End the current assist.  Returns the released evacuee so the caller
    /// can apply [`RELEASE_CALM`] to it.
    pub fn release(&mut self) -> Option<AgentId> {
        let id = self.assisting.take()?;
        self.core.notify(Notice::Released(id));
        Some(id)
    }

    /// Forget an assist whose evacuee no longer exists.  Silent: nobody is
    /// left to be released.
    pub fn drop_assist(&mut self) -> Option<AgentId> {
        self.assisting.take()
    }

    /// The nearest evacuee needing help within [`SEARCH_RADIUS`].
    ///
    /// Returns `None` while already assisting.  Only a strictly smaller
    /// distance replaces the current best, so exact ties go to the first
    /// candidate in iteration order.
    pub fn scan_for_needy<'a>(&self, agents: impl IntoIterator<Item = &'a Agent>) -> Option<AgentId> {
        if self.assisting.is_some() {
            return None;
        }
        let mut best: Option<AgentId> = None;
        let mut best_dist = SEARCH_RADIUS;
        for agent in agents {
            let Some(e) = agent.as_evacuee() else { continue };
            if !e.needs_assistance() {
                continue;
            }
            let d = self.core.position.distance(e.core.position);
            if d < best_dist {
                best_dist = d;
                best = Some(e.core.id);
            }
        }
        best
    }

    pub fn on_obstacle(&mut self) {
        self.core.notify(Notice::RescuerObstacle);
    }

    pub fn update(&mut self, dt: f64) {
        if self.core.state().is_terminal() {
            return;
        }
        let speed = self.effective_speed();
        self.core.move_toward_next(speed, dt);
    }

    pub fn clone_with_id(&self, id: AgentId) -> Rescuer {
        Rescuer {
            core: self.core.fresh_copy(id),
            assisting: None,
            carry_capacity_factor: self.carry_capacity_factor,
        }
    }
}
