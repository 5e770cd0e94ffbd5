//! The `Agent` tagged variant and the fields every variant shares.

use evac_core::{AgentId, AgentRng, Position};

use crate::motion::{step_toward, Route, ARRIVAL_EPSILON};
use crate::{AgentKind, AgentState, BehaviorKind, Evacuee, Notice, Rescuer};

// ── AgentCore ─────────────────────────────────────────────────────────────────

/// State common to evacuees and rescuers.
///
/// `state` is private: every transition goes through
/// [`set_state`](Self::set_state) so the matching [`Notice`] is never lost.
#[derive(Clone, Debug)]
pub struct AgentCore {
    pub id: AgentId,
    pub position: Position,
    pub route: Route,
    pub speed_base: f64,
    pub behavior: BehaviorKind,
    /// Cells entered since creation.  Maintained by the simulator.
    pub steps: u32,
    state: AgentState,
    notices: Vec<Notice>,
}

impl AgentCore {
    pub fn new(id: AgentId, position: Position, speed_base: f64, behavior: BehaviorKind) -> Self {
        Self {
            id,
            position,
            route: Route::new(),
            speed_base,
            behavior,
            steps: 0,
            state: AgentState::Normal,
            notices: Vec::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Transition to `next`, queueing the matching notice.  No-op if the
    /// state is unchanged or the agent has already evacuated.
    pub fn set_state(&mut self, next: AgentState) {
        let prev = self.state;
        if prev == next || prev.is_terminal() {
            return;
        }
        self.state = next;
        let notice = match next {
            AgentState::Normal => None,
            AgentState::Evacuating if prev == AgentState::Panicked => Some(Notice::Calmed),
            AgentState::Evacuating => Some(Notice::StartedEvacuating),
            AgentState::Panicked => Some(Notice::Panicked),
            AgentState::Blocked => Some(Notice::Blocked),
            AgentState::Evacuated => Some(Notice::Evacuated),
        };
        if let Some(n) = notice {
            self.notices.push(n);
        }
    }

    #[inline]
    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Pending notices, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the notice outbox.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Advance toward the front route cell at `speed` cells per second.
    ///
    /// On reaching the cell it is popped; if that empties a route queued as
    /// ending at an exit, the agent becomes `Evacuated`.
    pub fn move_toward_next(&mut self, speed: f64, dt: f64) {
        let Some(target) = self.route.front() else {
            return;
        };
        if self.position.distance(target) >= ARRIVAL_EPSILON {
            self.position = step_toward(self.position, target, speed * dt);
        }
        if self.position == target {
            self.route.pop_front();
            if self.route.is_empty() && self.route.ends_at_exit() {
                self.set_state(AgentState::Evacuated);
            }
        }
    }

    /// A copy with a new identity and a clean slate: `Normal`, no route, no
    /// steps, no pending notices.
    pub(crate) fn fresh_copy(&self, id: AgentId) -> Self {
        Self::new(id, self.position, self.speed_base, self.behavior)
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// One simulated pedestrian.
///
/// Not `Clone`: copies take a fresh id through
/// [`clone_with_id`](Self::clone_with_id).
#[derive(Debug)]
pub enum Agent {
    Evacuee(Evacuee),
    Rescuer(Rescuer),
}

impl Agent {
    #[inline]
    pub fn core(&self) -> &AgentCore {
        match self {
            Agent::Evacuee(e) => &e.core,
            Agent::Rescuer(r) => &r.core,
        }
    }

    #[inline]
    pub fn core_mut(&mut self) -> &mut AgentCore {
        match self {
            Agent::Evacuee(e) => &mut e.core,
            Agent::Rescuer(r) => &mut r.core,
        }
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.core().id
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.core().position
    }

    pub fn set_position(&mut self, pos: Position) {
        self.core_mut().position = pos;
    }

    #[inline]
    pub fn state(&self) -> AgentState {
        self.core().state()
    }

    pub fn set_state(&mut self, state: AgentState) {
        self.core_mut().set_state(state);
    }

    #[inline]
    pub fn behavior(&self) -> BehaviorKind {
        self.core().behavior
    }

    #[inline]
    pub fn steps(&self) -> u32 {
        self.core().steps
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            Agent::Evacuee(_) => AgentKind::Evacuee,
            Agent::Rescuer(_) => AgentKind::Rescuer,
        }
    }

    #[inline]
    pub fn is_evacuated(&self) -> bool {
        self.state() == AgentState::Evacuated
    }

    pub fn as_evacuee(&self) -> Option<&Evacuee> {
        match self {
            Agent::Evacuee(e) => Some(e),
            Agent::Rescuer(_) => None,
        }
    }

    pub fn as_evacuee_mut(&mut self) -> Option<&mut Evacuee> {
        match self {
            Agent::Evacuee(e) => Some(e),
            Agent::Rescuer(_) => None,
        }
    }

    pub fn as_rescuer(&self) -> Option<&Rescuer> {
        match self {
            Agent::Rescuer(r) => Some(r),
            Agent::Evacuee(_) => None,
        }
    }

    pub fn as_rescuer_mut(&mut self) -> Option<&mut Rescuer> {
        match self {
            Agent::Rescuer(r) => Some(r),
            Agent::Evacuee(_) => None,
        }
    }

    /// Speed in cells per second after all modifiers.
    pub fn effective_speed(&self) -> f64 {
        match self {
            Agent::Evacuee(e) => e.effective_speed(),
            Agent::Rescuer(r) => r.effective_speed(),
        }
    }

    /// Replace the route with the single cell `next`.
    pub fn queue_step(&mut self, next: Position, is_exit: bool) {
        self.core_mut().route = Route::single(next, is_exit);
    }

    pub fn clear_route(&mut self) {
        self.core_mut().route.clear();
    }

    /// Advance one tick of `dt` seconds.  No-op once evacuated.
    pub fn update(&mut self, dt: f64, rng: &mut AgentRng) {
        match self {
            Agent::Evacuee(e) => e.update(dt, rng),
            Agent::Rescuer(r) => r.update(dt),
        }
    }

    /// React to losing a contested cell.
    pub fn on_obstacle(&mut self) {
        match self {
            Agent::Evacuee(e) => e.on_obstacle(),
            Agent::Rescuer(r) => r.on_obstacle(),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.core_mut().take_notices()
    }

    /// Same variant and configuration under a new id.  Only the panic level
    /// and speed factor are carried over; state, route, step count and any
    /// assist relation start fresh.
    pub fn clone_with_id(&self, id: AgentId) -> Agent {
        match self {
            Agent::Evacuee(e) => Agent::Evacuee(e.clone_with_id(id)),
            Agent::Rescuer(r) => Agent::Rescuer(r.clone_with_id(id)),
        }
    }
}

impl From<Evacuee> for Agent {
    fn from(e: Evacuee) -> Self {
        Agent::Evacuee(e)
    }
}

impl From<Rescuer> for Agent {
    fn from(r: Rescuer) -> Self {
        Agent::Rescuer(r)
    }
}
