//! Grid movement integrator.
//!
//! Positions are grid-integral, but agents have real-valued speeds.  Each
//! update moves `min(speed * dt, distance)` along the unit vector toward the
//! front cell of the route and rounds the result back onto the grid.
//!
//! Anti-stall rule: when a nonzero intended displacement rounds back to the
//! starting cell, the agent instead takes one whole cell in the dominant
//! direction.  Without this, any agent with `speed * dt < 0.5` could never
//! leave its cell.

use std::collections::VecDeque;

use evac_core::Position;

/// Distances below this count as "already there".
pub const ARRIVAL_EPSILON: f64 = 1e-6;

// ── Route ─────────────────────────────────────────────────────────────────────

/// Cells an agent is walking toward, front first.
///
/// The simulator recomputes paths every tick, so in practice a route holds
/// at most the single next cell.  `ends_at_exit` records whether reaching
/// the last cell means leaving the building.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    cells: VecDeque<Position>,
    ends_at_exit: bool,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-cell route.
    pub fn single(cell: Position, ends_at_exit: bool) -> Self {
        Self {
            cells: VecDeque::from([cell]),
            ends_at_exit,
        }
    }

    #[inline]
    pub fn front(&self) -> Option<Position> {
        self.cells.front().copied()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Position> {
        self.cells.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn ends_at_exit(&self) -> bool {
        self.ends_at_exit
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.ends_at_exit = false;
    }

    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().copied()
    }
}

// ── Integrator ────────────────────────────────────────────────────────────────

/// Move from `from` toward `to` by at most `travel` cells.
///
/// Never overshoots `to`.  Returns `from` when already there or when
/// `travel` is not positive.
pub fn step_toward(from: Position, to: Position, travel: f64) -> Position {
    let dr = (to.row - from.row) as f64;
    let dc = (to.col - from.col) as f64;
    let dist = dr.hypot(dc);
    if dist < ARRIVAL_EPSILON || travel <= 0.0 {
        return from;
    }

    let travel = travel.min(dist);
    let row = from.row as f64 + dr / dist * travel;
    let col = from.col as f64 + dc / dist * travel;
    let next = Position::new(row.round() as i32, col.round() as i32);
    if next != from {
        return next;
    }

    // Anti-stall.
    if dr.abs() >= dc.abs() {
        from.offset(dr.signum() as i32, 0)
    } else {
        from.offset(0, dc.signum() as i32)
    }
}
