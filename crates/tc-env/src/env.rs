//! The `Env` struct and its episode state machine.

use std::fmt;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, error, info, warn};

use tc_control::{Assignments, ControlContext, ControlDispatcher, Roster};
use tc_core::{EngineParams, EnvParams, EpisodeClock, SignalId, SimRng, VehicleId};
use tc_engine::{
    Command, CommandLauncher, Connector, EngineError, Launcher, LifecycleEvents, ProcessSupervisor,
    ProtocolSession, VehicleVar,
};
use tc_scenario::ScenarioView;
use tc_vehicles::{SignalStore, VehicleStore};

use crate::task::{ActionApi, EnvView, Task};
use crate::{ColorTable, EnvError, EnvResult, InitialState};

// ── Episode state ─────────────────────────────────────────────────────────────

/// `Unstarted → Running → (Resetting → Running)* → Terminated`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EpisodeState {
    Unstarted,
    Running,
    Resetting,
    Terminated,
}

impl fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EpisodeState::Unstarted  => "unstarted",
            EpisodeState::Running    => "running",
            EpisodeState::Resetting  => "resetting",
            EpisodeState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

// ── Step results ──────────────────────────────────────────────────────────────

/// Diagnostics for one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepInfo {
    /// A vehicle started teleporting this tick.
    pub crashed:      bool,
    pub teleported:   Vec<VehicleId>,
    /// Steps since the episode started, including this one.
    pub time_counter: u64,
    /// The engine process was replaced at the start of this step.
    pub restarted:    bool,
}

#[derive(Clone, Debug)]
pub struct StepResult<O> {
    pub observation: O,
    pub reward:      f64,
    /// `true` iff a vehicle started teleporting this tick.
    pub done:        bool,
    pub info:        StepInfo,
}

// ── Env ───────────────────────────────────────────────────────────────────────

/// The episode manager.
///
/// `Env` owns the engine process (through its supervisor), the protocol
/// session, the vehicle and signal stores, the clock and the initial state.
/// All calls block; one step is one round trip with the engine.
///
/// Create via [`EnvBuilder`][crate::EnvBuilder].
pub struct Env<S, C, T, L = CommandLauncher>
where
    S: ScenarioView,
    C: Connector,
    T: Task,
    L: Launcher,
{
    pub(crate) params:      EnvParams,
    pub(crate) supervisor:  ProcessSupervisor<L>,
    pub(crate) connector:   C,
    pub(crate) session:     Option<C::Session>,
    pub(crate) scenario:    Arc<S>,
    pub(crate) roster:      Roster,
    pub(crate) assignments: Assignments,
    pub(crate) vehicles:    VehicleStore,
    pub(crate) signals:     SignalStore,
    pub(crate) dispatcher:  ControlDispatcher,
    pub(crate) task:        T,
    pub(crate) clock:       EpisodeClock,
    pub(crate) rng:         SimRng,
    pub(crate) initial:     InitialState,
    pub(crate) colors:      ColorTable,
    pub(crate) sorted_ids:  Vec<VehicleId>,
    /// Vehicles holding a telemetry subscription in the current session.
    pub(crate) subscribed:  FxHashSet<VehicleId>,
    pub(crate) state:       EpisodeState,
}

impl<S, C, T, L> Env<S, C, T, L>
where
    S: ScenarioView,
    C: Connector,
    T: Task,
    L: Launcher,
{
    pub(crate) fn new(
        engine: EngineParams,
        params: EnvParams,
        launcher: L,
        connector: C,
        scenario: Arc<S>,
        roster: Roster,
        task: T,
    ) -> Self {
        let clock = EpisodeClock::new(engine.step_length);
        Self {
            vehicles: VehicleStore::new(params.max_speed, params.lane_change_sentinel()),
            dispatcher: ControlDispatcher::from_params(&params),
            rng: SimRng::new(params.seed),
            supervisor: ProcessSupervisor::new(engine, launcher),
            connector,
            session: None,
            scenario,
            roster,
            assignments: Assignments::new(),
            signals: SignalStore::new(),
            task,
            clock,
            initial: InitialState::default(),
            colors: ColorTable::default(),
            sorted_ids: Vec::new(),
            subscribed: FxHashSet::default(),
            state: EpisodeState::Unstarted,
            params,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn params(&self) -> &EnvParams {
        &self.params
    }

    pub fn clock(&self) -> EpisodeClock {
        self.clock
    }

    pub fn vehicles(&self) -> &VehicleStore {
        &self.vehicles
    }

    pub fn signals(&self) -> &SignalStore {
        &self.signals
    }

    pub fn scenario(&self) -> &S {
        &self.scenario
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn initial_state(&self) -> &InitialState {
        &self.initial
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Ids sorted by absolute position when `sort_vehicles` is set,
    /// otherwise in store order.
    pub fn sorted_ids(&self) -> &[VehicleId] {
        &self.sorted_ids
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn task_mut(&mut self) -> &mut T {
        &mut self.task
    }

    pub fn supervisor(&self) -> &ProcessSupervisor<L> {
        &self.supervisor
    }

    pub fn view(&self) -> EnvView<'_> {
        EnvView {
            vehicles:   &self.vehicles,
            signals:    &self.signals,
            scenario:   &*self.scenario,
            sorted_ids: &self.sorted_ids,
            clock:      self.clock,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Launch the engine, subscribe every entity and seed the initial state.
    ///
    /// Fails with [`EnvError::RosterMismatch`] when fewer vehicles departed
    /// than the roster holds; the engine is torn down in that case.
    pub fn start(&mut self) -> EnvResult<()> {
        self.expect_state("start", &[EpisodeState::Unstarted])?;
        self.bring_up()?;

        let session = live(&mut self.session, "start", self.state)?;
        let captured = InitialState::capture(session, &self.vehicles, &self.roster.ids());
        self.initial = match captured {
            Ok(initial) => initial,
            Err(e) => {
                self.shut_down();
                return Err(e);
            }
        };

        self.colors = ColorTable::new(&self.roster, &mut self.rng);
        self.colors.paint(&mut self.vehicles)?;
        self.sorted_ids = self.sort_ids();
        self.state = EpisodeState::Running;
        info!(
            scenario = self.scenario.name(),
            vehicles = self.vehicles.len(),
            signals = self.signals.len(),
            "environment started"
        );
        Ok(())
    }

    /// Advance one step.  See the crate docs for the phase order.
    pub fn step(&mut self, action: &T::Action) -> EnvResult<StepResult<T::Observation>> {
        self.expect_state("step", &[EpisodeState::Running])?;

        self.clock.advance();
        let mut restarted = false;
        if self.clock.needs_restart(self.params.restart_threshold) {
            self.restart()?;
            restarted = true;
        }

        let time = self.clock.elapsed_secs();
        let step_length = self.clock.step_length;
        let (accels, lane_changes, routes) = {
            let ctx = ControlContext::new(time, step_length, &self.vehicles, &*self.scenario);
            (
                self.assignments.accelerations(&ctx),
                self.assignments.lane_changes(&ctx),
                self.assignments.routes(&ctx),
            )
        };

        let session = live(&mut self.session, "step", self.state)?;
        self.dispatcher.apply_acceleration(session, &self.vehicles, step_length, &accels)?;
        self.dispatcher.apply_lane_change(
            session,
            &mut self.vehicles,
            &*self.scenario,
            time,
            &lane_changes,
        )?;
        self.dispatcher.choose_routes(session, &self.vehicles, &routes)?;

        {
            let mut api = ActionApi::new(
                &mut *session,
                &mut self.vehicles,
                &self.signals,
                &*self.scenario,
                &self.dispatcher,
                &self.sorted_ids,
                self.clock,
            );
            self.task.apply_actions(action, &mut api)?;
            self.task.additional_command(&mut api)?;
        }

        session.advance()?;
        let events = self.refresh(&[])?;
        self.sorted_ids = self.sort_ids();

        let crashed = events.collision();
        if crashed {
            warn!(
                time_counter = self.clock.time_counter,
                vehicles = ?events.teleport_starting,
                "vehicles started teleporting, ending episode"
            );
        }

        let view = self.view();
        let observation = self.task.observe(&view);
        let reward = self.task.compute_reward(&view, action, crashed);
        Ok(StepResult {
            observation,
            reward,
            done: crashed,
            info: StepInfo {
                crashed,
                teleported: events.teleport_starting,
                time_counter: self.clock.time_counter,
                restarted,
            },
        })
    }

    /// Put every roster vehicle back at its starting placement and return the
    /// first observation of the new episode.
    ///
    /// With `starting_position_shuffle` or `vehicle_arrangement_shuffle` set,
    /// the placements are regenerated first and replace the initial state.
    /// Removal and insertion failures are logged; an insertion is retried
    /// once after a removal and then skipped.
    ///
    /// A failed reset leaves the env `Running` so the caller can retry, unless
    /// a forced restart failed and terminated it.
    pub fn reset(&mut self) -> EnvResult<T::Observation> {
        self.expect_state("reset", &[EpisodeState::Running])?;
        self.state = EpisodeState::Resetting;
        let result = self.reset_episode();
        if let Err(e) = &result {
            if self.state == EpisodeState::Resetting {
                warn!(error = %e, "reset failed");
                self.state = EpisodeState::Running;
            }
        }
        result
    }

    fn reset_episode(&mut self) -> EnvResult<T::Observation> {
        self.clock.reset_episode();
        if self.clock.needs_restart(self.params.restart_threshold) {
            self.restart()?;
        }

        self.colors = ColorTable::new(&self.roster, &mut self.rng);
        if self.params.starting_position_shuffle || self.params.vehicle_arrangement_shuffle {
            self.shuffle_initial_state()?;
        }

        let session = live(&mut self.session, "reset", self.state)?;

        // Drain the network, then whatever the store still tracks.
        for id in session.vehicle_ids()? {
            if let Err(e) = session.issue(&id, Command::Remove) {
                warn!(vehicle = %id, error = %e, "could not remove vehicle during reset");
            }
            self.vehicles.remove(&id);
            self.assignments.remove(&id);
            self.subscribed.remove(&id);
        }
        for id in self.vehicles.ids().to_vec() {
            if let Err(e) = session.issue(&id, Command::Remove) {
                debug!(vehicle = %id, error = %e, "stale vehicle not on the network");
            }
            self.vehicles.remove(&id);
            self.assignments.remove(&id);
            self.subscribed.remove(&id);
        }

        let mut skipped = 0;
        for entry in self.initial.iter() {
            let spawn = entry.spawn();
            if let Err(first) = session.issue(&entry.id, Command::Add(spawn.clone())) {
                debug!(vehicle = %entry.id, error = %first, "insertion failed, removing and retrying");
                if let Err(e) = session.issue(&entry.id, Command::Remove) {
                    debug!(vehicle = %entry.id, error = %e, "retry removal failed");
                }
                if let Err(e) = session.issue(&entry.id, Command::Add(spawn)) {
                    warn!(vehicle = %entry.id, error = %e, "could not re-insert vehicle, skipping it");
                    skipped += 1;
                }
            }
        }

        session.advance()?;
        self.refresh(&[])?;
        self.vehicles.reset_lane_changes(self.params.lane_change_sentinel());
        self.sorted_ids = self.sort_ids();
        self.state = EpisodeState::Running;
        info!(vehicles = self.vehicles.len(), skipped, global_step = self.clock.step_counter, "episode reset");

        Ok(self.task.observe(&self.view()))
    }

    /// Replace the engine process.
    ///
    /// The new process is brought up like [`start`](Self::start); the
    /// initial state survives, so the next reset restores the same roster
    /// identities.  A failed restart terminates the environment.
    pub fn restart(&mut self) -> EnvResult<()> {
        self.expect_state("restart", &[EpisodeState::Running, EpisodeState::Resetting])?;
        info!(global_step = self.clock.step_counter, "restarting engine");

        if let Err(e) = self.bring_up() {
            error!(error = %e, "engine restart failed");
            self.terminate();
            return Err(e);
        }
        self.clock.reset_process();
        self.colors.paint(&mut self.vehicles)?;
        self.sorted_ids = self.sort_ids();
        Ok(())
    }

    /// Restart with a different engine binary.
    pub fn restart_with_binary(&mut self, binary: impl Into<PathBuf>) -> EnvResult<()> {
        self.supervisor.set_binary(binary);
        self.restart()
    }

    /// Close the session and tear down the engine.  Idempotent.
    pub fn terminate(&mut self) {
        if self.state == EpisodeState::Terminated {
            return;
        }
        self.shut_down();
        self.state = EpisodeState::Terminated;
        info!("environment terminated");
    }

    /// Set a traffic signal's phase string.
    pub fn set_signal_state(&mut self, id: &SignalId, state: &str) -> EnvResult<()> {
        self.expect_state("set a signal", &[EpisodeState::Running])?;
        let session = live(&mut self.session, "set a signal", self.state)?;
        session.issue_signal(id, state)?;
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn expect_state(&self, op: &'static str, allowed: &[EpisodeState]) -> EnvResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(EnvError::InvalidState { op, state: self.state })
        }
    }

    fn shut_down(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.supervisor.teardown();
    }

    /// Launch a fresh engine and rebuild the stores from it.
    ///
    /// Any failure after the launch closes the session and tears the process
    /// down again.
    fn bring_up(&mut self) -> EnvResult<()> {
        if let Some(mut old) = self.session.take() {
            old.close();
        }
        let session = self.supervisor.start(&mut self.connector, self.scenario.name())?;
        self.session = Some(session);
        let result = self.subscribe_all();
        if result.is_err() {
            self.shut_down();
        }
        result
    }

    fn subscribe_all(&mut self) -> EnvResult<()> {
        let session = live(&mut self.session, "start", self.state)?;

        let expected = self.roster.len();
        let departed = session.departed_count()?;
        if departed < expected {
            error!(expected, departed, "not enough vehicles departed, bad start");
            return Err(EnvError::RosterMismatch { expected, departed });
        }

        session.subscribe_lifecycle()?;
        self.subscribed.clear();
        let ids = session.vehicle_ids()?;
        for id in &ids {
            subscribe_vehicle(session, id, self.params.leader_lookahead)?;
            self.subscribed.insert(id.clone());
        }
        for id in session.signal_ids()? {
            session.subscribe_signal(&id)?;
            self.signals.observe(&id);
        }
        session.advance()?;

        self.vehicles.clear();
        self.assignments.clear();
        self.refresh(&ids)?;
        debug!(vehicles = self.vehicles.len(), "subscriptions in place");
        Ok(())
    }

    /// Fold the last tick into the stores.
    ///
    /// `seeded` ids are treated as departed this tick; start uses this for
    /// vehicles that departed before the lifecycle subscription existed.
    fn refresh(&mut self, seeded: &[VehicleId]) -> EnvResult<LifecycleEvents> {
        let session = live(&mut self.session, "refresh", self.state)?;
        let mut snap = session.collect()?;

        for id in &snap.events.arrived {
            self.subscribed.remove(id);
        }
        let mut departed = seeded.to_vec();
        departed.extend(snap.events.departed.iter().cloned());

        let fresh: Vec<VehicleId> =
            departed.iter().filter(|id| !self.subscribed.contains(*id)).cloned().collect();
        if !fresh.is_empty() {
            for id in &fresh {
                match subscribe_vehicle(session, id, self.params.leader_lookahead) {
                    Ok(()) => {
                        self.subscribed.insert(id.clone());
                    }
                    Err(EngineError::Rejected { reason, .. }) => {
                        warn!(vehicle = %id, %reason, "could not subscribe departed vehicle");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            snap = session.collect()?;
        }

        let mut events = mem::take(&mut snap.events);
        events.departed = departed;

        let delta = self.vehicles.apply_snapshot(&snap.vehicles, &events, &*self.scenario);
        for id in &delta.removed {
            self.assignments.remove(id);
            self.subscribed.remove(id);
        }
        for id in &delta.created {
            let type_id = self.vehicles.get(id)?.type_id.clone();
            self.assignments.assign(id, &type_id, &self.roster);
            if let Some(color) = self.colors.color_for(&type_id) {
                self.vehicles.set_color(id, color)?;
            }
        }
        self.signals.apply_snapshot(&snap.signals);
        Ok(events)
    }

    /// Regenerate starting placements and write them into the initial state.
    fn shuffle_initial_state(&mut self) -> EnvResult<()> {
        let x0 = if self.params.starting_position_shuffle {
            self.rng.uniform(0.0, self.scenario.length())
        } else {
            self.params.initial_offset
        };
        let mut order = self.initial.ids();
        if self.params.vehicle_arrangement_shuffle {
            self.rng.shuffle(&mut order);
        }
        let slots = self.scenario.generate_starting_positions(order.len(), x0)?;
        self.initial.rearrange(&order, &slots, &*self.scenario);
        debug!(x0, vehicles = order.len(), "initial placements regenerated");
        Ok(())
    }

    fn sort_ids(&self) -> Vec<VehicleId> {
        if self.params.sort_vehicles {
            self.vehicles.sorted_by_position()
        } else {
            self.vehicles.ids().to_vec()
        }
    }
}

fn live<'s, P>(session: &'s mut Option<P>, op: &'static str, state: EpisodeState) -> EnvResult<&'s mut P> {
    session.as_mut().ok_or(EnvError::InvalidState { op, state })
}

fn subscribe_vehicle<P: ProtocolSession + ?Sized>(
    session: &mut P,
    id: &VehicleId,
    lookahead: f64,
) -> Result<(), EngineError> {
    session.subscribe(id, &VehicleVar::ALL)?;
    session.subscribe_leader(id, lookahead)
}
