//! Unit tests for tc-env.
//!
//! Every environment runs against the in-process mock engine with a mock
//! launcher, so no process is ever spawned.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use tc_control::{ConstantAccel, Controllers, Roster};
    use tc_core::{EngineParams, EnvParams};
    use tc_engine::mock::{MockEngine, MockLauncher, MockScenario};
    use tc_scenario::EdgeNetwork;

    use crate::{Env, EnvBuilder, PassiveTask, Task};

    pub type TestEnv<T = PassiveTask> = Env<EdgeNetwork, MockEngine, T, MockLauncher>;

    /// Four 50 m edges, 200 m around.
    pub fn ring(lanes: usize) -> Arc<EdgeNetwork> {
        Arc::new(EdgeNetwork::ring("ring", 4, 50.0, lanes).unwrap())
    }

    /// Three controlled `human` vehicles and one uncontrolled `rl` vehicle.
    pub fn roster() -> Roster {
        Roster::new()
            .add("human", 3, Controllers::none().with_acceleration(ConstantAccel(0.0)))
            .add("rl", 1, Controllers::none())
    }

    /// Roster vehicles evenly spaced at 5 m/s, looping their routes.
    pub fn engine(net: &Arc<EdgeNetwork>, roster: &Roster) -> MockEngine {
        MockEngine::new(
            MockScenario::new(Arc::clone(net), 0.1)
                .wrap_routes(true)
                .with_evenly_spaced(&roster.ids_with_types(), 5.0)
                .unwrap()
                .with_signal("tl", "GrGr", "0"),
        )
    }

    pub fn engine_params() -> EngineParams {
        EngineParams {
            settle_secs: 0.0,
            launch_retries: 2,
            connect_retries: 2,
            connect_retry_delay_ms: 0,
            ..EngineParams::default()
        }
    }

    pub fn build_with<T: Task>(
        net: &Arc<EdgeNetwork>,
        roster: Roster,
        engine: &MockEngine,
        params: EnvParams,
        task: T,
    ) -> (TestEnv<T>, MockLauncher) {
        let launcher = MockLauncher::default();
        let env = EnvBuilder::new(Arc::clone(net), engine.clone(), task)
            .roster(roster)
            .engine_params(engine_params())
            .env_params(params)
            .launcher(launcher.clone())
            .build()
            .unwrap();
        (env, launcher)
    }

    pub fn build(
        net: &Arc<EdgeNetwork>,
        roster: Roster,
        engine: &MockEngine,
        params: EnvParams,
    ) -> (TestEnv, MockLauncher) {
        build_with(net, roster, engine, params, PassiveTask)
    }

    /// The default fixture, already started.
    pub fn started(params: EnvParams) -> (TestEnv, MockEngine, MockLauncher) {
        let net = ring(2);
        let roster = roster();
        let engine = engine(&net, &roster);
        let (mut env, launcher) = build(&net, roster, &engine, params);
        env.start().unwrap();
        (env, engine, launcher)
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use tc_core::{EnvParams, SignalId};

    use crate::{EnvError, EpisodeState};

    use super::helpers::*;

    #[test]
    fn start_tracks_roster_and_seeds_initial_state() {
        let (env, engine, launcher) = started(EnvParams::default());
        assert_eq!(env.state(), EpisodeState::Running);
        assert_eq!(env.vehicles().len(), 4);
        assert_eq!(env.initial_state().ids(), env.roster().ids());
        assert_eq!(env.signals().state(&SignalId::from("tl")).unwrap(), "GrGr");
        assert_eq!(launcher.spawns(), 1);
        assert_eq!(engine.connect_count(), 1);
        // Handshake tick plus the extra subscription tick.
        assert_eq!(engine.tick(), 2);
    }

    #[test]
    fn start_twice_is_rejected() {
        let (mut env, _engine, _launcher) = started(EnvParams::default());
        let err = env.start().unwrap_err();
        assert!(matches!(err, EnvError::InvalidState { op: "start", state: EpisodeState::Running }));
    }

    #[test]
    fn step_before_start_is_rejected() {
        let net = ring(1);
        let roster = roster();
        let engine = engine(&net, &roster);
        let (mut env, _launcher) = build(&net, roster, &engine, EnvParams::default());
        assert!(matches!(env.step(&()), Err(EnvError::InvalidState { .. })));
        assert!(matches!(env.reset(), Err(EnvError::InvalidState { .. })));
    }

    #[test]
    fn roster_mismatch_tears_the_engine_down() {
        let net = ring(2);
        let roster = roster();
        let engine = engine(&net, &roster);
        engine.withhold_departures(1);
        let (mut env, launcher) = build(&net, roster, &engine, EnvParams::default());

        let err = env.start().unwrap_err();
        assert!(matches!(err, EnvError::RosterMismatch { expected: 4, departed: 3 }));
        assert_eq!(env.state(), EpisodeState::Unstarted);
        assert_eq!(launcher.terminates(), 1);
        assert_eq!(engine.close_count(), 1);
        assert!(!env.supervisor().is_running());
    }

    #[test]
    fn launch_failures_are_retried() {
        let net = ring(2);
        let roster = roster();
        let engine = engine(&net, &roster);
        let (mut env, launcher) = build(&net, roster, &engine, EnvParams::default());
        launcher.fail_next_spawns(1);
        env.start().unwrap();
        assert_eq!(launcher.spawns(), 1);
        assert_eq!(env.vehicles().len(), 4);
    }

    #[test]
    fn terminate_is_idempotent() {
        let (mut env, engine, launcher) = started(EnvParams::default());
        env.terminate();
        env.terminate();
        assert_eq!(env.state(), EpisodeState::Terminated);
        assert_eq!(launcher.terminates(), 1);
        assert_eq!(engine.close_count(), 1);
        assert!(matches!(
            env.step(&()),
            Err(EnvError::InvalidState { state: EpisodeState::Terminated, .. })
        ));
    }

    #[test]
    fn every_type_gets_a_distinct_color() {
        let (env, _engine, _launcher) = started(EnvParams::default());
        let human = env.vehicles().get(&"human_0".into()).unwrap().color.unwrap();
        let human2 = env.vehicles().get(&"human_2".into()).unwrap().color.unwrap();
        let rl = env.vehicles().get(&"rl_0".into()).unwrap().color.unwrap();
        assert_eq!(human, human2);
        assert_ne!(human, rl);
    }
}

// ── Stepping ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stepping {
    use std::sync::Arc;

    use tc_control::{ConstantAccel, ControlContext, Controllers, FixedLane, Roster, RoutingController};
    use tc_core::{EdgeId, EnvParams, SignalId, VehicleId};
    use tc_engine::Command;
    use tc_engine::mock::{MockEngine, MockScenario};

    use super::helpers::*;

    #[test]
    fn step_issues_controller_commands() {
        let (mut env, engine, _launcher) = started(EnvParams::default());
        engine.clear_commands();
        let result = env.step(&()).unwrap();

        assert!(!result.done);
        assert_eq!(result.info.time_counter, 1);
        assert_eq!(env.clock().time_counter, 1);
        assert_eq!(result.observation.len(), 4);

        let slowed: Vec<VehicleId> = engine
            .commands()
            .into_iter()
            .filter(|(_, c)| matches!(c, Command::SlowDown { .. }))
            .map(|(id, _)| id)
            .collect();
        let ids: Vec<String> = slowed.iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, ["human_0", "human_1", "human_2"]);
    }

    #[test]
    fn teleport_ends_the_episode() {
        let (mut env, engine, _launcher) = started(EnvParams::default());
        engine.teleport_at(engine.tick() + 1, "human_1");

        let result = env.step(&()).unwrap();
        assert!(result.done);
        assert!(result.info.crashed);
        assert_eq!(result.info.teleported, [VehicleId::from("human_1")]);
        assert_eq!(result.reward, 0.0);

        let next = env.step(&()).unwrap();
        assert!(!next.done);
    }

    #[test]
    fn sorted_ids_follow_absolute_position() {
        let params = EnvParams { sort_vehicles: true, ..EnvParams::default() };
        let (mut env, _engine, _launcher) = started(params);
        for _ in 0..7 {
            env.step(&()).unwrap();
            let xs: Vec<f64> = env
                .sorted_ids()
                .iter()
                .map(|id| env.vehicles().absolute_position(id).unwrap())
                .collect();
            assert!(xs.windows(2).all(|w| w[0] <= w[1]), "unsorted positions {xs:?}");
        }
    }

    #[test]
    fn unsorted_ids_keep_every_vehicle() {
        let (mut env, _engine, _launcher) = started(EnvParams::default());
        env.step(&()).unwrap();
        assert_eq!(env.sorted_ids().len(), env.vehicles().len());
        assert_eq!(env.sorted_ids(), env.vehicles().ids());
    }

    struct FollowScenarioRoute;

    impl RoutingController for FollowScenarioRoute {
        fn choose_route(&self, vehicle: &VehicleId, ctx: &ControlContext<'_>) -> Option<Vec<EdgeId>> {
            let edge = ctx.vehicles.edge(vehicle).ok()??;
            ctx.scenario.route_from(edge).map(<[EdgeId]>::to_vec)
        }
    }

    #[test]
    fn single_lane_skips_lane_changes_only() {
        let net = ring(1);
        let roster = Roster::new().add(
            "human",
            2,
            Controllers::none()
                .with_acceleration(ConstantAccel(1.0))
                .with_lane_change(FixedLane(1))
                .with_routing(FollowScenarioRoute),
        );
        let engine = engine(&net, &roster);
        let (mut env, _launcher) = build(&net, roster, &engine, EnvParams::default());
        env.start().unwrap();
        engine.clear_commands();

        env.step(&()).unwrap();
        let commands = engine.commands();
        let count = |kind: &str| commands.iter().filter(|(_, c)| c.kind() == kind).count();
        assert_eq!(count("slow_down"), 2);
        assert_eq!(count("set_route"), 2);
        assert_eq!(count("change_lane"), 0);
        for v in env.vehicles().iter() {
            assert!((v.speed - 5.1).abs() < 1e-9);
        }
    }

    #[test]
    fn arrived_vehicles_leave_the_store() {
        let net = ring(1);
        let roster = roster();
        let engine = MockEngine::new(
            MockScenario::new(Arc::clone(&net), 0.1)
                .with_evenly_spaced(&roster.ids_with_types(), 100.0)
                .unwrap(),
        );
        let (mut env, _launcher) = build(&net, roster, &engine, EnvParams::default());
        env.start().unwrap();
        // 200 m routes at 10 m per tick.
        for _ in 0..25 {
            env.step(&()).unwrap();
        }
        assert!(env.vehicles().is_empty());
        assert!(env.sorted_ids().is_empty());
    }

    #[test]
    fn signal_state_reaches_the_store() {
        let (mut env, engine, _launcher) = started(EnvParams::default());
        let tl = SignalId::from("tl");
        env.set_signal_state(&tl, "rrrr").unwrap();
        env.step(&()).unwrap();
        assert_eq!(env.signals().state(&tl).unwrap(), "rrrr");
        assert_eq!(engine.signal_commands(), [(tl, "rrrr".to_string())]);
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tasks {
    use tc_core::{EnvParams, VehicleId};
    use tc_engine::Command;

    use crate::{ActionApi, EnvResult, EnvView, Task};

    use super::helpers::*;

    /// Accelerates `rl_0` by the action; reward is its speed, -10 on a crash.
    struct DriveRl;

    impl Task for DriveRl {
        type Action = f64;
        type Observation = f64;

        fn apply_actions(&mut self, action: &f64, api: &mut ActionApi<'_>) -> EnvResult<()> {
            api.apply_acceleration(&[(VehicleId::from("rl_0"), *action)])
        }

        fn observe(&self, view: &EnvView<'_>) -> f64 {
            view.vehicles.speed(&VehicleId::from("rl_0")).unwrap_or(0.0)
        }

        fn compute_reward(&self, view: &EnvView<'_>, _action: &f64, crashed: bool) -> f64 {
            if crashed { -10.0 } else { self.observe(view) }
        }
    }

    #[test]
    fn caller_actions_go_through_the_dispatcher() {
        let net = ring(2);
        let roster = roster();
        let engine = engine(&net, &roster);
        let (mut env, _launcher) = build_with(&net, roster, &engine, EnvParams::default(), DriveRl);
        env.start().unwrap();
        engine.clear_commands();

        let result = env.step(&2.0).unwrap();
        assert!((result.observation - 5.2).abs() < 1e-9);
        assert!((result.reward - 5.2).abs() < 1e-9);
        assert!(engine.commands().iter().any(|(id, c)| {
            id.as_str() == "rl_0" && matches!(c, Command::SlowDown { speed, .. } if (speed - 5.2).abs() < 1e-9)
        }));

        // A large negative action never asks for a negative speed.
        let result = env.step(&-1_000.0).unwrap();
        assert_eq!(result.observation, 0.0);
    }

    #[test]
    fn crash_overrides_reward() {
        let net = ring(2);
        let roster = roster();
        let engine = engine(&net, &roster);
        let (mut env, _launcher) = build_with(&net, roster, &engine, EnvParams::default(), DriveRl);
        env.start().unwrap();
        engine.teleport_at(engine.tick() + 1, "human_0");
        let result = env.step(&0.0).unwrap();
        assert!(result.done);
        assert_eq!(result.reward, -10.0);
    }
}

// ── Reset ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod reset {
    use std::collections::BTreeSet;

    use tc_core::{EnvParams, VehicleId};

    use super::helpers::*;

    fn placements(env: &TestEnv) -> Vec<(String, String, usize, f64)> {
        env.vehicles()
            .iter()
            .map(|v| {
                let edge = v.edge.as_ref().map(|e| e.to_string()).unwrap_or_default();
                (v.id.to_string(), edge, v.lane, v.lane_position)
            })
            .collect()
    }

    #[test]
    fn repeated_resets_keep_the_roster() {
        let (mut env, _engine, _launcher) = started(EnvParams::default());
        for _ in 0..5 {
            for _ in 0..3 {
                env.step(&()).unwrap();
            }
            let obs = env.reset().unwrap();
            assert_eq!(obs.len(), 4);
            assert_eq!(env.vehicles().len(), 4);
            assert_eq!(env.clock().time_counter, 0);
            for id in env.roster().ids() {
                let v = env.vehicles().get(&id).unwrap();
                assert_eq!(v.last_lane_change, -5.0);
                assert!(v.color.is_some());
            }
        }
    }

    #[test]
    fn reset_restores_initial_placement() {
        let (mut env, _engine, _launcher) = started(EnvParams::default());
        for _ in 0..10 {
            env.step(&()).unwrap();
        }
        env.reset().unwrap();
        for entry in env.initial_state().iter() {
            let v = env.vehicles().get(&entry.id).unwrap();
            assert_eq!(v.edge.as_ref(), Some(&entry.edge));
            assert_eq!(v.lane, entry.lane);
            assert!((v.lane_position - entry.position).abs() < 1e-9);
        }
    }

    #[test]
    fn global_counter_survives_reset() {
        let (mut env, _engine, _launcher) = started(EnvParams::default());
        for _ in 0..3 {
            env.step(&()).unwrap();
        }
        env.reset().unwrap();
        assert_eq!(env.clock().time_counter, 0);
        assert_eq!(env.clock().step_counter, 3);
    }

    #[test]
    fn arrangement_shuffle_permutes_the_same_slots() {
        let params = EnvParams { vehicle_arrangement_shuffle: true, seed: 7, ..EnvParams::default() };
        let (mut env, _engine, _launcher) = started(params);
        let slots = |env: &TestEnv| -> BTreeSet<(String, usize, i64)> {
            placements(env)
                .into_iter()
                .map(|(_, edge, lane, pos)| (edge, lane, (pos * 1000.0).round() as i64))
                .collect()
        };
        // Slots are regenerated from offset 0 on the first reset.
        env.reset().unwrap();
        let before = slots(&env);
        for _ in 0..3 {
            env.step(&()).unwrap();
            env.reset().unwrap();
            assert_eq!(env.vehicles().len(), 4);
            assert_eq!(slots(&env), before);
        }
    }

    #[test]
    fn position_shuffle_rewrites_initial_state() {
        let params = EnvParams { starting_position_shuffle: true, seed: 11, ..EnvParams::default() };
        let (mut env, _engine, _launcher) = started(params);
        env.reset().unwrap();
        assert_eq!(env.vehicles().len(), 4);
        for entry in env.initial_state().iter() {
            assert_eq!(entry.route.as_str(), format!("route{}", entry.edge));
            let v = env.vehicles().get(&entry.id).unwrap();
            assert_eq!(v.edge.as_ref(), Some(&entry.edge));
            assert!((v.lane_position - entry.position).abs() < 1e-9);
        }
    }

    #[test]
    fn engine_inserted_vehicles_are_not_restored() {
        use tc_core::{EdgeId, RouteId, VehicleTypeId};
        use tc_engine::VehicleSpawn;
        use tc_engine::mock::{MockEngine, MockScenario};

        let net = ring(2);
        let roster = roster();
        let engine = MockEngine::new(
            MockScenario::new(std::sync::Arc::clone(&net), 0.1)
                .wrap_routes(true)
                .with_evenly_spaced(&roster.ids_with_types(), 5.0)
                .unwrap()
                .with_vehicle("inflow_0", VehicleSpawn {
                    route:    RouteId::for_edge(&EdgeId::from("e1")),
                    type_id:  VehicleTypeId::from("inflow"),
                    lane:     0,
                    position: 25.0,
                    speed:    5.0,
                }),
        );
        let (mut env, _launcher) = build(&net, roster, &engine, EnvParams::default());
        env.start().unwrap();

        let inflow = VehicleId::from("inflow_0");
        assert_eq!(env.vehicles().len(), 5);
        assert!(env.vehicles().contains(&inflow));
        assert_eq!(env.initial_state().len(), 4);
        assert!(env.initial_state().get(&inflow).is_none());
        assert!(env.assignments.get(&inflow).is_none_or(|c| c.is_empty()));

        env.step(&()).unwrap();
        env.reset().unwrap();
        assert_eq!(env.vehicles().len(), 4);
        assert!(!env.vehicles().contains(&inflow));
    }

    #[test]
    fn failed_reset_can_be_retried() {
        use crate::{EnvError, EpisodeState};
        use tc_engine::EngineError;

        let (mut env, engine, _launcher) = started(EnvParams::default());
        engine.fail_next_advances(1);
        let err = env.reset().unwrap_err();
        assert!(matches!(err, EnvError::Engine(EngineError::Protocol(_))));
        assert_eq!(env.state(), EpisodeState::Running);

        let obs = env.reset().unwrap();
        assert_eq!(obs.len(), 4);
        env.step(&()).unwrap();
    }

    #[test]
    fn failed_insert_is_retried_once() {
        let (mut env, engine, _launcher) = started(EnvParams::default());
        engine.fail_add("human_0", 1);
        env.reset().unwrap();
        assert_eq!(env.vehicles().len(), 4);
    }

    #[test]
    fn twice_failed_insert_is_skipped() {
        let (mut env, engine, _launcher) = started(EnvParams::default());
        engine.fail_add("human_0", 2);
        env.reset().unwrap();
        assert_eq!(env.vehicles().len(), 3);
        assert!(!env.vehicles().contains(&VehicleId::from("human_0")));

        // The initial state still holds it, so the next reset brings it back.
        env.reset().unwrap();
        assert_eq!(env.vehicles().len(), 4);
    }
}

// ── Restart ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod restart {
    use tc_core::{EnvParams, VehicleId};

    use super::helpers::*;

    fn roster_order(env: &TestEnv) -> Vec<VehicleId> {
        let roster = env.roster().ids();
        env.vehicles().ids().iter().filter(|id| roster.contains(id)).cloned().collect()
    }

    #[test]
    fn threshold_restarts_the_process() {
        let params = EnvParams { restart_threshold: 3, ..EnvParams::default() };
        let (mut env, engine, launcher) = started(params);
        let before = roster_order(&env);
        let initial = env.initial_state().ids();

        for _ in 0..3 {
            assert!(!env.step(&()).unwrap().info.restarted);
        }
        let result = env.step(&()).unwrap();
        assert!(result.info.restarted);
        assert_eq!(engine.connect_count(), 2);
        assert_eq!(launcher.spawns(), 2);
        assert_eq!(launcher.terminates(), 1);
        assert_eq!(env.clock().step_counter, 0);
        assert_eq!(env.clock().time_counter, 4);
        assert_eq!(roster_order(&env), before);
        assert_eq!(env.initial_state().ids(), initial);

        env.reset().unwrap();
        assert_eq!(roster_order(&env), before);
    }

    #[test]
    fn explicit_restart_keeps_the_roster() {
        let (mut env, engine, _launcher) = started(EnvParams::default());
        env.step(&()).unwrap();
        env.restart().unwrap();
        assert_eq!(engine.connect_count(), 2);
        assert_eq!(env.vehicles().len(), 4);
        env.step(&()).unwrap();
    }

    #[test]
    fn restart_with_binary_relaunches_that_binary() {
        let (mut env, _engine, launcher) = started(EnvParams::default());
        env.restart_with_binary("sumo-gui").unwrap();
        let command = launcher.last_command().unwrap();
        assert_eq!(command.program.to_str(), Some("sumo-gui"));
    }

    #[test]
    fn failed_restart_terminates() {
        let (mut env, engine, _launcher) = started(EnvParams::default());
        engine.fail_next_connects(10);
        assert!(env.restart().is_err());
        assert_eq!(env.state(), crate::EpisodeState::Terminated);
    }
}

// ── Experiment ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod experiment {
    use tc_core::EnvParams;

    use crate::{EnvObserver, EnvView, Experiment, ExperimentReport, RolloutSummary, StepInfo};

    use super::helpers::*;

    #[derive(Default)]
    struct Counter {
        resets:   usize,
        steps:    usize,
        rollouts: usize,
        finished: usize,
    }

    impl EnvObserver for Counter {
        fn on_reset(&mut self, _run: usize, _view: &EnvView<'_>) {
            self.resets += 1;
        }

        fn on_step_end(&mut self, _run: usize, _view: &EnvView<'_>, _reward: f64, _info: &StepInfo) {
            self.steps += 1;
        }

        fn on_rollout_end(&mut self, _summary: &RolloutSummary) {
            self.rollouts += 1;
        }

        fn on_experiment_end(&mut self, _report: &ExperimentReport) {
            self.finished += 1;
        }
    }

    #[test]
    fn runs_every_rollout() {
        let net = ring(2);
        let roster = roster();
        let engine = engine(&net, &roster);
        let (env, _launcher) = build(&net, roster, &engine, EnvParams::default());

        let mut exp = Experiment::new(env);
        let mut counter = Counter::default();
        let report = exp.run(2, 5, |_| (), &mut counter).unwrap();

        assert_eq!(report.rollouts.len(), 2);
        assert!(report.rollouts.iter().all(|r| r.steps == 5 && !r.crashed));
        for speed in report.mean_speeds() {
            assert!((speed - 5.0).abs() < 1e-9);
        }
        assert_eq!(report.returns(), [0.0, 0.0]);
        assert_eq!((counter.resets, counter.steps, counter.rollouts, counter.finished), (2, 10, 2, 1));
    }

    #[test]
    fn crash_ends_the_rollout_early() {
        let (env, engine, _launcher) = started(EnvParams::default());
        // Reset takes one tick, so the second step of the rollout crashes.
        engine.teleport_at(engine.tick() + 3, "rl_0");

        let mut exp = Experiment::new(env);
        let report = exp.run(1, 10, |_| (), &mut crate::NoopObserver).unwrap();
        assert_eq!(report.rollouts[0].steps, 2);
        assert!(report.rollouts[0].crashed);
    }
}

// ── Colors and initial state ─────────────────────────────────────────────────

#[cfg(test)]
mod parts {
    use tc_core::{SimRng, VehicleId};
    use tc_scenario::{ScenarioView, StartSlot};

    use crate::{ColorTable, InitialState, PALETTE};

    use super::helpers::*;

    #[test]
    fn colors_are_consecutive_palette_entries() {
        let roster = roster();
        for seed in 0..10 {
            let table = ColorTable::new(&roster, &mut SimRng::new(seed));
            let idx = |t: &str| {
                let c = table.color_for(&t.into()).unwrap();
                PALETTE.iter().position(|p| *p == c).unwrap()
            };
            assert_eq!(idx("rl"), (idx("human") + 1) % PALETTE.len());
        }
        let table = ColorTable::new(&roster, &mut SimRng::new(0));
        assert_eq!(table.len(), 2);
        assert!(table.color_for(&"inflow".into()).is_none());
    }

    #[test]
    fn rearrange_moves_vehicles_to_slots() {
        let (env, _engine, _launcher) = started(tc_core::EnvParams::default());
        let mut initial: InitialState = env.initial_state().clone();
        let net = ring(2);
        let order = [VehicleId::from("rl_0"), VehicleId::from("human_0")];
        let slots = [
            StartSlot { edge: "e1".into(), position: 10.0, lane: 1 },
            StartSlot { edge: "e3".into(), position: 20.0, lane: 0 },
        ];
        initial.rearrange(&order, &slots, &*net);

        let rl = initial.get(&order[0]).unwrap();
        assert_eq!(rl.route.as_str(), "routee1");
        assert_eq!(rl.lane, 1);
        assert_eq!(rl.absolute_position, net.absolute_position(&"e1".into(), 10.0).unwrap());
        let human = initial.get(&order[1]).unwrap();
        assert_eq!(human.edge.as_str(), "e3");
        assert_eq!(initial.len(), 4);
    }
}
