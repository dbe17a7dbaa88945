//! Read-only state passed to every controller call.

use tc_scenario::ScenarioView;
use tc_vehicles::VehicleStore;

/// A read-only view of the control loop for one decide phase.
///
/// Built by the episode manager right before the controllers run; nothing
/// mutates the store while a context is alive.
pub struct ControlContext<'a> {
    /// Simulated seconds since the episode started.
    pub time: f64,

    /// Simulated seconds per step.
    pub step_length: f64,

    pub vehicles: &'a VehicleStore,

    pub scenario: &'a dyn ScenarioView,
}

impl<'a> ControlContext<'a> {
    #[inline]
    pub fn new(
        time:        f64,
        step_length: f64,
        vehicles:    &'a VehicleStore,
        scenario:    &'a dyn ScenarioView,
    ) -> Self {
        Self { time, step_length, vehicles, scenario }
    }
}
