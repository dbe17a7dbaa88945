//! Task hooks: what the caller's actions mean, what is observed, and how a
//! step is scored.

use tc_control::{ControlDispatcher, LaneChange};
use tc_core::{EdgeId, EpisodeClock, SignalId, VehicleId};
use tc_engine::ProtocolSession;
use tc_scenario::ScenarioView;
use tc_vehicles::{SignalStore, VehicleStore};

use crate::EnvResult;

/// Read-only view of the environment after a refresh.
pub struct EnvView<'a> {
    pub vehicles:   &'a VehicleStore,
    pub signals:    &'a SignalStore,
    pub scenario:   &'a dyn ScenarioView,
    /// Ids in the order of the last sort.
    pub sorted_ids: &'a [VehicleId],
    pub clock:      EpisodeClock,
}

impl EnvView<'_> {
    /// Mean speed of the tracked vehicles, 0 when none are tracked.
    pub fn mean_speed(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        self.vehicles.iter().map(|v| v.speed).sum::<f64>() / self.vehicles.len() as f64
    }
}

/// Command access handed to [`Task::apply_actions`] and
/// [`Task::additional_command`].
///
/// Commands go through the same dispatcher and clamps as the roster
/// controllers.
pub struct ActionApi<'a> {
    session:    &'a mut dyn ProtocolSession,
    vehicles:   &'a mut VehicleStore,
    signals:    &'a SignalStore,
    scenario:   &'a dyn ScenarioView,
    dispatcher: &'a ControlDispatcher,
    sorted_ids: &'a [VehicleId],
    clock:      EpisodeClock,
}

impl<'a> ActionApi<'a> {
    pub(crate) fn new(
        session:    &'a mut dyn ProtocolSession,
        vehicles:   &'a mut VehicleStore,
        signals:    &'a SignalStore,
        scenario:   &'a dyn ScenarioView,
        dispatcher: &'a ControlDispatcher,
        sorted_ids: &'a [VehicleId],
        clock:      EpisodeClock,
    ) -> Self {
        Self { session, vehicles, signals, scenario, dispatcher, sorted_ids, clock }
    }

    pub fn vehicles(&self) -> &VehicleStore {
        self.vehicles
    }

    pub fn signals(&self) -> &SignalStore {
        self.signals
    }

    pub fn scenario(&self) -> &dyn ScenarioView {
        self.scenario
    }

    /// Ids in the order of the previous step's sort.
    pub fn sorted_ids(&self) -> &[VehicleId] {
        self.sorted_ids
    }

    pub fn clock(&self) -> EpisodeClock {
        self.clock
    }

    pub fn apply_acceleration(&mut self, actions: &[(VehicleId, f64)]) -> EnvResult<()> {
        self.dispatcher.apply_acceleration(
            &mut *self.session,
            &*self.vehicles,
            self.clock.step_length,
            actions,
        )?;
        Ok(())
    }

    /// Returns the number of lane-change commands issued.
    pub fn apply_lane_change(&mut self, actions: &[(VehicleId, LaneChange)]) -> EnvResult<usize> {
        let issued = self.dispatcher.apply_lane_change(
            &mut *self.session,
            &mut *self.vehicles,
            self.scenario,
            self.clock.elapsed_secs(),
            actions,
        )?;
        Ok(issued)
    }

    pub fn choose_routes(&mut self, actions: &[(VehicleId, Option<Vec<EdgeId>>)]) -> EnvResult<()> {
        self.dispatcher.choose_routes(&mut *self.session, &*self.vehicles, actions)?;
        Ok(())
    }

    /// Set a traffic signal's phase string.  The store reflects it after the
    /// next tick.
    pub fn set_signal_state(&mut self, id: &SignalId, state: &str) -> EnvResult<()> {
        self.session.issue_signal(id, state)?;
        Ok(())
    }
}

/// The task-specific part of an environment.
///
/// Only `observe` and `compute_reward` are required; the command hooks
/// default to doing nothing.
pub trait Task {
    type Action;
    type Observation;

    /// Turn the caller's action into commands.  Runs after the roster
    /// controllers, before the tick.
    fn apply_actions(&mut self, _action: &Self::Action, _api: &mut ActionApi<'_>) -> EnvResult<()> {
        Ok(())
    }

    /// Extra commands issued every step right before the tick.
    fn additional_command(&mut self, _api: &mut ActionApi<'_>) -> EnvResult<()> {
        Ok(())
    }

    fn observe(&self, view: &EnvView<'_>) -> Self::Observation;

    /// `crashed` is true when a vehicle started teleporting this tick.
    fn compute_reward(&self, view: &EnvView<'_>, action: &Self::Action, crashed: bool) -> f64;
}

/// No actions, zero reward; observes vehicle speeds in sorted order.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassiveTask;

impl Task for PassiveTask {
    type Action = ();
    type Observation = Vec<f64>;

    fn observe(&self, view: &EnvView<'_>) -> Vec<f64> {
        view.sorted_ids
            .iter()
            .filter_map(|id| view.vehicles.speed(id).ok())
            .collect()
    }

    fn compute_reward(&self, _view: &EnvView<'_>, _action: &(), _crashed: bool) -> f64 {
        0.0
    }
}
