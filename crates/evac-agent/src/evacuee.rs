//! Evacuee: a person heading for an exit under panic and mobility modifiers.

use evac_core::{AgentId, AgentRng, Position};

use crate::{AgentCore, AgentState, BehaviorKind, Notice};

/// Panic strictly above this means panicked.
pub const PANIC_THRESHOLD: f64 = 0.7;
/// A panicked evacuee whose panic drops strictly below this calms down.
pub const CALM_THRESHOLD: f64 = 0.5;
/// Above this, each update carries [`BLOCK_CHANCE`] of freezing.
pub const EXTREME_PANIC: f64 = 0.9;
pub const BLOCK_CHANCE: f64 = 0.01;
/// Panic lost per simulated second.
pub const PANIC_DECAY_PER_SEC: f64 = 0.1;
/// Panic gained on losing a contested cell.
pub const OBSTACLE_PANIC: f64 = 0.1;

pub const PANIC_SPEED_MULTIPLIER: f64 = 1.3;
pub const REDUCED_MOBILITY_MULTIPLIER: f64 = 0.6;

/// Base walking speed (cells per second) for an age and mobility profile.
pub fn base_speed(age: u32, reduced_mobility: bool) -> f64 {
    if reduced_mobility {
        0.8
    } else if age < 18 {
        1.8
    } else if age < 60 {
        1.5
    } else {
        1.0
    }
}

/// Age-band speed factor.
pub fn age_factor(age: u32) -> f64 {
    match age {
        0..=11 => 0.8,
        12..=17 => 1.1,
        18..=59 => 1.0,
        60..=74 => 0.7,
        _ => 0.5,
    }
}

#[derive(Clone, Debug)]
pub struct Evacuee {
    pub core: AgentCore,
    age: u32,
    panic_level: f64,
    reduced_mobility: bool,
    speed_factor: f64,
}

impl Evacuee {
    pub fn new(id: AgentId, position: Position, age: u32, reduced_mobility: bool) -> Self {
        let behavior = if reduced_mobility {
            BehaviorKind::ReducedMobility
        } else {
            BehaviorKind::Normal
        };
        Self {
            core: AgentCore::new(id, position, base_speed(age, reduced_mobility), behavior),
            age,
            panic_level: 0.0,
            reduced_mobility,
            speed_factor: age_factor(age),
        }
    }

    /// Start with `level` panic already applied.
    pub fn with_panic(mut self, level: f64) -> Self {
        self.raise_panic(level);
        self.refresh_behavior();
        self.core.take_notices();
        self
    }

    #[inline]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[inline]
    pub fn panic_level(&self) -> f64 {
        self.panic_level
    }

    #[inline]
    pub fn reduced_mobility(&self) -> bool {
        self.reduced_mobility
    }

    #[inline]
    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    #[inline]
    pub fn is_panicked(&self) -> bool {
        self.panic_level > PANIC_THRESHOLD
    }

    /// Whether a rescuer would pick this evacuee up.
    pub fn needs_assistance(&self) -> bool {
        let state = self.core.state();
        state != AgentState::Evacuated
            && (self.reduced_mobility || self.is_panicked() || state == AgentState::Blocked)
    }

    pub fn effective_speed(&self) -> f64 {
        let mut speed = self.core.speed_base * self.speed_factor;
        if self.is_panicked() {
            speed *= PANIC_SPEED_MULTIPLIER;
        }
        if self.reduced_mobility {
            speed *= REDUCED_MOBILITY_MULTIPLIER;
        }
        speed
    }

    /// Add `amount` panic, saturating at 1.
    pub fn raise_panic(&mut self, amount: f64) {
        self.panic_level = (self.panic_level + amount).min(1.0);
        if self.is_panicked() && self.core.state() != AgentState::Panicked {
            self.core.set_state(AgentState::Panicked);
        }
    }

    /// Remove `amount` panic, saturating at 0.
    pub fn calm(&mut self, amount: f64) {
        self.panic_level = (self.panic_level - amount).max(0.0);
        if self.panic_level < CALM_THRESHOLD && self.core.state() == AgentState::Panicked {
            self.core.set_state(AgentState::Evacuating);
        }
    }

    pub fn on_obstacle(&mut self) {
        self.raise_panic(OBSTACLE_PANIC);
        self.core.notify(Notice::ObstacleHit);
    }

    pub fn update(&mut self, dt: f64, rng: &mut AgentRng) {
        if self.core.state() == AgentState::Evacuated {
            return;
        }

        self.refresh_behavior();
        let speed = self.effective_speed();
        self.core.move_toward_next(speed, dt);
        if self.core.state() == AgentState::Evacuated {
            return;
        }

        if self.panic_level > 0.0 {
            self.calm(PANIC_DECAY_PER_SEC * dt);
        }
        if self.panic_level > EXTREME_PANIC && rng.chance(BLOCK_CHANCE) {
            self.core.set_state(AgentState::Blocked);
        }
    }

    fn refresh_behavior(&mut self) {
        self.core.behavior = if self.is_panicked() {
            BehaviorKind::Panic
        } else if self.reduced_mobility {
            BehaviorKind::ReducedMobility
        } else {
            BehaviorKind::Normal
        };
    }

    pub fn clone_with_id(&self, id: AgentId) -> Evacuee {
        Evacuee {
            core: self.core.fresh_copy(id),
            age: self.age,
            panic_level: self.panic_level,
            reduced_mobility: self.reduced_mobility,
            speed_factor: self.speed_factor,
        }
    }
}
