//! Tests for evac-sim.

use evac_agent::{Agent, Evacuee, Rescuer};
use evac_core::{AgentId, Position, SimConfig, Tick};
use evac_spatial::{CellKind, Grid};

use crate::{SimBuilder, SimEvent, SimObserver, SimOutcome};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config() -> SimConfig {
    SimConfig {
        tick_duration_secs:         0.5,
        max_ticks_without_movement: 10,
        max_ticks:                  None,
        seed:                       42,
    }
}

fn adult(id: u32, row: i32, col: i32) -> Agent {
    Evacuee::new(AgentId(id), Position::new(row, col), 30, false).into()
}

/// `rows x cols` floor grid with the given exits.
fn grid_with_exits(rows: usize, cols: usize, exits: &[(i32, i32)]) -> Grid {
    let mut g = Grid::new(rows, cols);
    for &(r, c) in exits {
        g.set_cell(Position::new(r, c), CellKind::Exit);
    }
    g
}

/// Records everything it is told.
#[derive(Default)]
struct Recorder {
    starts: usize,
    ends: Vec<SimOutcome>,
    tick_ends: Vec<Tick>,
    events: Vec<SimEvent>,
}

impl SimObserver for Recorder {
    fn on_sim_start(&mut self, _grid: &Grid, _agent_count: usize) {
        self.starts += 1;
    }
    fn on_event(&mut self, event: &SimEvent) {
        self.events.push(event.clone());
    }
    fn on_tick_end(&mut self, tick: Tick, _elapsed_secs: f64, _agents: &[Agent]) {
        self.tick_ends.push(tick);
    }
    fn on_sim_end(&mut self, outcome: SimOutcome, _tick: Tick, _elapsed_secs: f64) {
        self.ends.push(outcome);
    }
}

impl Recorder {
    fn evacuations(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::Evacuated(_)))
            .count()
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::{SimError, SimStatus};
    use evac_core::EvacError;

    #[test]
    fn missing_grid_is_no_scenario() {
        let result = SimBuilder::new(test_config()).agent(adult(1, 0, 0)).build();
        assert!(matches!(result, Err(SimError::NoScenario)));
    }

    #[test]
    fn bad_config_is_rejected() {
        let mut cfg = test_config();
        cfg.tick_duration_secs = 0.0;
        let result = SimBuilder::new(cfg).grid(Grid::new(2, 2)).build();
        assert!(matches!(result, Err(SimError::Config(_))));

        let mut cfg = test_config();
        cfg.max_ticks_without_movement = 0;
        let result = SimBuilder::new(cfg).grid(Grid::new(2, 2)).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = SimBuilder::new(test_config())
            .grid(grid_with_exits(3, 3, &[(0, 0)]))
            .agents([adult(1, 1, 1), adult(1, 2, 2)])
            .build();
        assert!(matches!(
            result,
            Err(SimError::Core(EvacError::DuplicateAgent(AgentId(1))))
        ));
    }

    #[test]
    fn builds_idle() {
        let sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(3, 3, &[(0, 0)]))
            .agent(adult(1, 2, 2))
            .build()
            .unwrap();
        assert_eq!(sim.status(), SimStatus::Idle);
        assert_eq!(sim.live_count(), 1);
        assert!(sim.agent(AgentId(1)).is_some());
    }
}

// ── Lifecycle commands ────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;
    use crate::{NoopObserver, SimError, SimStatus};

    #[test]
    fn refuses_to_start_without_agents() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(3, 3, &[(0, 0)]))
            .build()
            .unwrap();
        assert!(matches!(sim.start(), Err(SimError::NoAgents)));
        assert_eq!(sim.status(), SimStatus::Idle);
    }

    #[test]
    fn refuses_to_start_without_exit() {
        let mut sim = SimBuilder::new(test_config())
            .grid(Grid::new(3, 3))
            .agent(adult(1, 1, 1))
            .build()
            .unwrap();
        assert!(matches!(sim.start(), Err(SimError::NoExit)));
    }

    #[test]
    fn start_twice_is_invalid() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(3, 3, &[(0, 0)]))
            .agent(adult(1, 2, 2))
            .build()
            .unwrap();
        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(SimError::InvalidState { action: "start", .. })));
    }

    #[test]
    fn pause_preserves_state_and_blocks_ticks() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(10, 10, &[(0, 0)]))
            .agent(adult(1, 9, 9))
            .build()
            .unwrap();
        sim.run_ticks(3, &mut NoopObserver).unwrap();
        let pos = sim.agents()[0].position();
        sim.pause().unwrap();
        assert!(sim.tick(&mut NoopObserver).is_err());
        assert_eq!(sim.agents()[0].position(), pos);
        assert_eq!(sim.current_tick(), Tick(3));

        // Editing is allowed while paused, not while running.
        sim.set_cell(Position::new(5, 5), CellKind::Wall).unwrap();
        sim.resume().unwrap();
        assert!(sim.set_cell(Position::new(5, 6), CellKind::Wall).is_err());
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), SimOutcome::Evacuated);
    }

    #[test]
    fn reset_clears_everything() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(4, 6, &[(0, 0)]))
            .agents([adult(1, 3, 3), adult(2, 3, 4)])
            .build()
            .unwrap();
        sim.run_ticks(2, &mut NoopObserver).unwrap();
        sim.reset();
        assert_eq!(sim.status(), SimStatus::Idle);
        assert_eq!(sim.live_count(), 0);
        assert_eq!(sim.current_tick(), Tick::ZERO);
        assert_eq!((sim.grid().rows(), sim.grid().cols()), (4, 6));
        assert!(!sim.grid().has_exit());
        assert_eq!(sim.pending_events().last(), Some(&SimEvent::Reset));
    }

    #[test]
    fn add_agent_rejects_duplicates_and_running() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(5, 5, &[(0, 0)]))
            .agent(adult(1, 4, 4))
            .build()
            .unwrap();
        assert!(sim.add_agent(adult(1, 3, 3)).is_err());
        sim.add_agent(adult(2, 3, 3)).unwrap();
        sim.start().unwrap();
        assert!(sim.add_agent(adult(3, 2, 2)).is_err());
        assert_eq!(sim.live_count(), 2);
    }

    #[test]
    fn observer_hooks_fire_once_per_lifecycle_event() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(4, 4, &[(0, 0)]))
            .agent(adult(1, 3, 3))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        let outcome = sim.run(&mut rec).unwrap();
        assert_eq!(outcome, SimOutcome::Evacuated);
        assert_eq!(rec.starts, 1);
        assert_eq!(rec.ends, vec![SimOutcome::Evacuated]);
        assert_eq!(rec.tick_ends.len() as u64, sim.current_tick().0);
        assert!(sim.pending_events().is_empty());
    }

    #[test]
    fn tick_limit_completes_run() {
        let mut cfg = test_config();
        cfg.max_ticks = Some(5);
        let mut sim = SimBuilder::new(cfg)
            .grid(grid_with_exits(10, 10, &[(0, 0)]))
            .agent(adult(1, 9, 9))
            .build()
            .unwrap();
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), SimOutcome::TickLimit);
        assert_eq!(sim.current_tick(), Tick(5));
        assert_eq!(sim.live_count(), 1);
    }
}

// ── Tick loop behaviour ───────────────────────────────────────────────────────

#[cfg(test)]
mod tick_loop {
    use super::*;
    use evac_agent::{AgentState, Notice};
    use crate::{NoopObserver, SimStatus};

    #[test]
    fn single_agent_reaches_corner_exit() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(10, 10, &[(0, 0)]))
            .agent(adult(1, 9, 9))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        let outcome = sim.run(&mut rec).unwrap();
        assert_eq!(outcome, SimOutcome::Evacuated);
        assert!(sim.current_tick() <= Tick(18));

        let evac = rec
            .events
            .iter()
            .find_map(|e| match e {
                SimEvent::Evacuated(ev) => Some(*ev),
                _ => None,
            })
            .unwrap();
        assert_eq!(evac.agent_id, AgentId(1));
        assert_eq!(evac.exit, Position::new(0, 0));
        assert_eq!(evac.steps, 18);
        assert!((evac.elapsed_secs - 9.0).abs() < 1e-9);
    }

    #[test]
    fn agent_already_on_exit_leaves_without_moving() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(3, 3, &[(1, 1)]))
            .agent(adult(1, 1, 1))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        assert_eq!(sim.run(&mut rec).unwrap(), SimOutcome::Evacuated);
        assert_eq!(sim.current_tick(), Tick(1));
        assert_eq!(rec.evacuations(), 1);
    }

    #[test]
    fn contested_cell_goes_to_first_agent() {
        // W E W
        // W . W
        // . . .
        let mut grid = grid_with_exits(3, 3, &[(0, 1)]);
        for p in [(0, 0), (0, 2), (1, 0), (1, 2)] {
            grid.set_cell(p.into(), CellKind::Wall);
        }
        let mut sim = SimBuilder::new(test_config())
            .grid(grid)
            .agents([adult(1, 2, 0), adult(2, 2, 2)])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(1, &mut rec).unwrap();

        assert_eq!(sim.agent(AgentId(1)).unwrap().position(), Position::new(2, 1));
        assert_eq!(sim.agent(AgentId(2)).unwrap().position(), Position::new(2, 2));
        assert!(rec.events.contains(&SimEvent::Collision {
            agent: AgentId(2),
            at:    Position::new(2, 1),
        }));
        assert!(rec.events.contains(&SimEvent::Agent {
            agent:  AgentId(2),
            kind:   evac_agent::AgentKind::Evacuee,
            notice: Notice::ObstacleHit,
        }));
        let loser = sim.agent(AgentId(2)).unwrap().as_evacuee().unwrap();
        assert!(loser.panic_level() > 0.0);
    }

    #[test]
    fn occupied_exit_is_not_contested() {
        // . E, with the later-stored agent already standing on the exit.
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(1, 2, &[(0, 1)]))
            .agents([adult(1, 0, 0), adult(2, 0, 1)])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        assert_eq!(sim.run(&mut rec).unwrap(), SimOutcome::Evacuated);
        assert_eq!(sim.current_tick(), Tick(1));
        assert!(!rec.events.iter().any(|e| matches!(e, SimEvent::Collision { .. })));
        assert_eq!(rec.evacuations(), 2);

        let first = rec
            .events
            .iter()
            .find_map(|e| match e {
                SimEvent::Evacuated(ev) if ev.agent_id == AgentId(1) => Some(*ev),
                _ => None,
            })
            .unwrap();
        assert_eq!(first.exit, Position::new(0, 1));
        assert_eq!(first.steps, 1);
    }

    #[test]
    fn blocked_agent_resumes_once_freed() {
        let mut grid = grid_with_exits(5, 5, &[(0, 0)]);
        for p in Position::new(3, 3).neighbours() {
            grid.set_cell(p, CellKind::Wall);
        }
        let mut sim = SimBuilder::new(test_config())
            .grid(grid)
            .agent(adult(1, 3, 3))
            .build()
            .unwrap();
        sim.run_ticks(1, &mut NoopObserver).unwrap();
        assert_eq!(sim.agents()[0].state(), AgentState::Blocked);
        assert_eq!(sim.ticks_without_movement(), 1);

        sim.pause().unwrap();
        sim.set_cell(Position::new(2, 3), CellKind::Floor).unwrap();
        sim.resume().unwrap();

        let mut rec = Recorder::default();
        sim.tick(&mut rec).unwrap();
        let agent = sim.agent(AgentId(1)).unwrap();
        assert_eq!(agent.state(), AgentState::Evacuating);
        assert_eq!(agent.position(), Position::new(2, 3));
        assert_eq!(sim.ticks_without_movement(), 0);
        assert!(rec.events.contains(&SimEvent::Agent {
            agent:  AgentId(1),
            kind:   evac_agent::AgentKind::Evacuee,
            notice: Notice::StartedEvacuating,
        }));

        assert_eq!(sim.run(&mut rec).unwrap(), SimOutcome::Evacuated);
    }

    #[test]
    fn enclosed_agent_stagnates() {
        let mut grid = grid_with_exits(5, 5, &[(0, 0)]);
        for p in Position::new(3, 3).neighbours() {
            grid.set_cell(p, CellKind::Wall);
        }
        let mut sim = SimBuilder::new(test_config())
            .grid(grid)
            .agent(adult(1, 3, 3))
            .build()
            .unwrap();
        let outcome = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(outcome, SimOutcome::Stagnated);
        assert_eq!(sim.current_tick(), Tick(10));
        assert_eq!(sim.status(), SimStatus::Completed(SimOutcome::Stagnated));
        assert_eq!(sim.agents()[0].state(), AgentState::Blocked);
        assert_eq!(sim.evacuated_count(), 0);
    }

    #[test]
    fn no_agent_disappears_without_an_evacuation_event() {
        let mut grid = grid_with_exits(8, 8, &[(0, 3), (7, 7)]);
        for c in 0..6 {
            grid.set_cell(Position::new(4, c), CellKind::Wall);
        }
        let agents: Vec<Agent> = (0..12)
            .map(|i| adult(i + 1, 5 + (i / 4) as i32, (i % 4) as i32))
            .chain([
                Agent::from(Rescuer::new(AgentId(50), Position::new(2, 2))),
                Evacuee::new(AgentId(51), Position::new(1, 6), 80, true).into(),
            ])
            .collect();
        let mut sim = SimBuilder::new(test_config())
            .grid(grid)
            .agents(agents)
            .build()
            .unwrap();
        sim.start().unwrap();

        let mut total = 0;
        while sim.status().is_running() {
            let before = sim.live_count();
            let mut rec = Recorder::default();
            sim.tick(&mut rec).unwrap();
            let evacuated = rec.evacuations();
            assert_eq!(before, sim.live_count() + evacuated);
            total += evacuated;
        }
        assert_eq!(total, 14);
        assert_eq!(sim.status(), SimStatus::Completed(SimOutcome::Evacuated));
    }

    #[test]
    fn snapshot_reflects_live_agents() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(5, 5, &[(0, 0)]))
            .agents([adult(1, 4, 4), adult(2, 4, 0)])
            .build()
            .unwrap();
        sim.run_ticks(1, &mut NoopObserver).unwrap();
        let views = sim.snapshot();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, AgentId(1));
        assert_eq!(views[0].position.manhattan(Position::new(4, 4)), 1);
        assert_eq!(views[0].state, AgentState::Evacuating);
    }
}

// ── Rescuers ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rescue {
    use super::*;
    use evac_agent::{AgentKind, AgentState, Notice};
    use crate::NoopObserver;

    #[test]
    fn stale_assist_is_cleared() {
        let mut rescuer = Rescuer::new(AgentId(1), Position::new(4, 4));
        rescuer.assist(AgentId(99));
        rescuer.core.take_notices();
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(5, 5, &[(0, 0)]))
            .agent(rescuer.into())
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(1, &mut rec).unwrap();

        let r = sim.agent(AgentId(1)).unwrap().as_rescuer().unwrap();
        assert_eq!(r.assisting(), None);
        assert!(!rec.events.iter().any(|e| matches!(
            e,
            SimEvent::Agent { notice: Notice::Released(_), .. }
        )));
    }

    #[test]
    fn rescuer_picks_up_needy_evacuee() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(9, 9, &[(0, 0)]))
            .agents([
                Rescuer::new(AgentId(1), Position::new(8, 0)).into(),
                adult(2, 8, 2),
                Evacuee::new(AgentId(3), Position::new(8, 8), 40, true).into(),
            ])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(1, &mut rec).unwrap();

        let r = sim.agent(AgentId(1)).unwrap().as_rescuer().unwrap();
        assert_eq!(r.assisting(), Some(AgentId(3)));
        assert!(rec.events.contains(&SimEvent::Agent {
            agent:  AgentId(1),
            kind:   AgentKind::Rescuer,
            notice: Notice::Assisting(AgentId(3)),
        }));
    }

    #[test]
    fn evacuating_rescuer_releases_and_calms() {
        let panicked = Evacuee::new(AgentId(2), Position::new(2, 2), 30, false).with_panic(0.8);
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(3, 3, &[(0, 0)]))
            .agents([
                Rescuer::new(AgentId(1), Position::new(0, 1)).into(),
                panicked.into(),
            ])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(1, &mut rec).unwrap();

        assert!(sim.agent(AgentId(1)).is_none(), "rescuer left through the exit");
        assert!(rec.events.contains(&SimEvent::Agent {
            agent:  AgentId(1),
            kind:   AgentKind::Rescuer,
            notice: Notice::Released(AgentId(2)),
        }));
        let e = sim.agent(AgentId(2)).unwrap();
        assert_eq!(e.state(), AgentState::Evacuating);
        // 0.8 - 0.5 on release, then 0.1/s decay over one 0.5 s tick.
        let level = e.as_evacuee().unwrap().panic_level();
        assert!((level - 0.25).abs() < 1e-9);
    }

    #[test]
    fn adjacent_evacuee_is_escorted() {
        let mut sim = SimBuilder::new(test_config())
            .grid(grid_with_exits(3, 3, &[(0, 1)]))
            .agents([
                Rescuer::new(AgentId(1), Position::new(2, 1)).into(),
                Evacuee::new(AgentId(2), Position::new(2, 2), 30, true).into(),
            ])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(1, &mut rec).unwrap();

        assert!(rec.events.contains(&SimEvent::Moved {
            agent: AgentId(2),
            kind:  AgentKind::Evacuee,
            from:  Position::new(2, 2),
            to:    Position::new(1, 1),
        }));
        assert_eq!(sim.run(&mut NoopObserver).unwrap(), SimOutcome::Evacuated);
        assert_eq!(sim.evacuated_count(), 2);
    }
}

// ── Scenario documents ────────────────────────────────────────────────────────

#[cfg(test)]
mod scenario {
    use super::*;
    use evac_agent::{AgentState, BehaviorKind};
    use crate::scenario::save;
    use crate::{Scenario, ScenarioError};

    const DOC: &str = r#"{
        "rows": 3, "columns": 4,
        "grid": [[2,0,0,0],[1,1,0,1],[0,0,0,0]],
        "agents": [
            {"id": 1, "x": 2, "y": 0, "behaviorKind": 0, "age": 70, "reducedMobility": false},
            {"id": 4, "x": 2, "y": 3, "behaviorKind": 3},
            {"id": 2, "x": 0, "y": 3, "behaviorKind": 1},
            {"id": 3, "x": 2, "y": 1, "behaviorKind": 2}
        ]
    }"#;

    #[test]
    fn parses_document() {
        let s = Scenario::from_json_str(DOC).unwrap();
        assert_eq!((s.grid.rows(), s.grid.cols()), (3, 4));
        assert!(s.grid.is_exit(Position::new(0, 0)));
        assert!(!s.grid.is_transitable(Position::new(1, 0)));
        assert_eq!(s.agents.len(), 4);

        assert_eq!(s.agents[0].as_evacuee().unwrap().age(), 70);
        assert_eq!(s.agents[1].behavior(), BehaviorKind::Rescuer);
        assert_eq!(s.agents[2].state(), AgentState::Panicked);
        assert_eq!(s.agents[2].as_evacuee().unwrap().age(), 30);
        assert!(s.agents[3].as_evacuee().unwrap().reduced_mobility());
        assert_eq!(s.id_generator().peek(), AgentId(5));
    }

    #[test]
    fn rejects_invalid_documents() {
        let bad_dims = r#"{"rows": 2, "columns": 2, "grid": [[0,0]]}"#;
        assert!(matches!(Scenario::from_json_str(bad_dims), Err(ScenarioError::Grid(_))));

        let bad_code = r#"{"rows": 1, "columns": 2, "grid": [[0,5]]}"#;
        assert!(matches!(Scenario::from_json_str(bad_code), Err(ScenarioError::Grid(_))));

        let dup = r#"{"rows": 1, "columns": 2, "grid": [[2,0]],
            "agents": [{"id":1,"x":0,"y":1,"behaviorKind":0},{"id":1,"x":0,"y":0,"behaviorKind":0}]}"#;
        assert!(matches!(Scenario::from_json_str(dup), Err(ScenarioError::DuplicateId(1))));

        let outside = r#"{"rows": 1, "columns": 2, "grid": [[2,0]],
            "agents": [{"id":1,"x":3,"y":0,"behaviorKind":0}]}"#;
        assert!(matches!(Scenario::from_json_str(outside), Err(ScenarioError::OutOfBounds { .. })));

        let behavior = r#"{"rows": 1, "columns": 2, "grid": [[2,0]],
            "agents": [{"id":1,"x":0,"y":1,"behaviorKind":9}]}"#;
        assert!(matches!(Scenario::from_json_str(behavior), Err(ScenarioError::Agent(_))));

        assert!(matches!(Scenario::from_json_str("not json"), Err(ScenarioError::Json(_))));
    }

    #[test]
    fn save_and_reload() {
        let original = Scenario::from_json_str(DOC).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        save(&path, &original.grid, &original.agents).unwrap();

        let reloaded = Scenario::load(&path).unwrap();
        assert_eq!(reloaded.grid, original.grid);
        assert_eq!(reloaded.to_document(), original.to_document());
    }

    #[test]
    fn builder_accepts_scenario() {
        let s = Scenario::from_json_str(DOC).unwrap();
        let sim = SimBuilder::new(test_config()).scenario(s).build().unwrap();
        assert_eq!(sim.live_count(), 4);
        assert!(sim.grid().has_exit());
    }
}
