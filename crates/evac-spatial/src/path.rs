//! Next-step path finding.
//!
//! # Pluggability
//!
//! `evac-sim` queries paths through the [`PathFinder`] trait, so a caller can
//! swap in a different search (A*, flow fields) without touching the tick
//! loop.  The default [`BfsPathFinder`] is an unweighted breadth-first search
//! over the 4-connected transitable cells.
//!
//! Paths are never cached: the simulator asks again every tick for every
//! agent, so the answer always reflects the current walls.  Other agents are
//! not obstacles here; the tick loop resolves those as collisions.

use std::collections::VecDeque;

use evac_core::Position;

use crate::Grid;

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable next-step search.
pub trait PathFinder {
    /// The first cell after `start` on a shortest path to `goal`.
    ///
    /// Returns `start` unchanged when `start == goal` or when `goal` is not
    /// reachable.  Callers read an unchanged position as "blocked".
    fn next_step(&self, grid: &Grid, start: Position, goal: Position) -> Position;
}

// ── BfsPathFinder ─────────────────────────────────────────────────────────────

/// Breadth-first search expanding neighbours in the fixed order
/// up, down, left, right.  O(rows * cols) per query.
#[derive(Copy, Clone, Debug, Default)]
pub struct BfsPathFinder;

impl PathFinder for BfsPathFinder {
    fn next_step(&self, grid: &Grid, start: Position, goal: Position) -> Position {
        if start == goal {
            return start;
        }
        match search(grid, start, goal) {
            Some(parent) => first_step(grid, &parent, start, goal),
            None => start,
        }
    }
}

/// Length in steps of a shortest 4-connected path, or `None` if unreachable.
pub fn bfs_distance(grid: &Grid, start: Position, goal: Position) -> Option<usize> {
    if start == goal {
        return grid.in_bounds(start).then_some(0);
    }
    let parent = search(grid, start, goal)?;
    let mut steps = 0;
    let mut cur = grid.index(goal)?;
    let origin = grid.index(start)?;
    while cur != origin {
        cur = parent[cur]?;
        steps += 1;
    }
    Some(steps)
}

// ── BFS internals ─────────────────────────────────────────────────────────────

/// Run BFS from `start` until `goal` is dequeued.  Returns the parent table
/// (indexed by flat cell index) if `goal` was reached.
fn search(grid: &Grid, start: Position, goal: Position) -> Option<Vec<Option<usize>>> {
    let origin = grid.index(start)?;
    let target = grid.index(goal)?;

    let mut visited = vec![false; grid.area()];
    let mut parent: Vec<Option<usize>> = vec![None; grid.area()];
    let mut queue = VecDeque::new();

    visited[origin] = true;
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        let Some(ci) = grid.index(cur) else { continue };
        if ci == target {
            return Some(parent);
        }
        for next in cur.neighbours() {
            if !grid.is_transitable(next) {
                continue;
            }
            let Some(ni) = grid.index(next) else { continue };
            if visited[ni] {
                continue;
            }
            visited[ni] = true;
            parent[ni] = Some(ci);
            queue.push_back(next);
        }
    }
    None
}

/// Walk parents back from `goal` to the cell whose parent is `start`.
fn first_step(grid: &Grid, parent: &[Option<usize>], start: Position, goal: Position) -> Position {
    let (Some(origin), Some(mut cur)) = (grid.index(start), grid.index(goal)) else {
        return start;
    };
    while let Some(p) = parent[cur] {
        if p == origin {
            return grid.position(cur);
        }
        cur = p;
    }
    start
}
