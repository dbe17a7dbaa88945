//! Simple controllers for tests, demos and passive populations.

use tc_core::{EdgeId, VehicleId};

use crate::controller::{AccelerationController, LaneChange, LaneChangeController, RoutingController};
use crate::ControlContext;

/// Always requests the same acceleration.
pub struct ConstantAccel(pub f64);

impl AccelerationController for ConstantAccel {
    fn get_accel(&self, _vehicle: &VehicleId, _ctx: &ControlContext<'_>) -> Option<f64> {
        Some(self.0)
    }
}

/// Closes the gap to a desired speed within one step, bounded by comfort
/// limits.
pub struct TargetSpeed {
    pub speed:     f64,
    pub max_accel: f64,
    pub max_decel: f64,
}

impl TargetSpeed {
    pub fn new(speed: f64) -> Self {
        Self { speed, max_accel: 1.0, max_decel: 1.5 }
    }
}

impl AccelerationController for TargetSpeed {
    fn get_accel(&self, vehicle: &VehicleId, ctx: &ControlContext<'_>) -> Option<f64> {
        let current = ctx.vehicles.speed(vehicle).ok()?;
        if ctx.step_length <= 0.0 {
            return None;
        }
        let wanted = (self.speed - current) / ctx.step_length;
        Some(wanted.clamp(-self.max_decel, self.max_accel))
    }
}

/// Keeps the vehicle in one lane.
pub struct FixedLane(pub usize);

impl LaneChangeController for FixedLane {
    fn get_lane_change(&self, _vehicle: &VehicleId, _ctx: &ControlContext<'_>) -> Option<LaneChange> {
        Some(LaneChange::Target(self.0))
    }
}

/// Extends a vehicle's trip forever.
///
/// Once the vehicle reaches the last edge of its route, the scenario route
/// starting on that edge is assigned.
pub struct ContinuousRouter;

impl RoutingController for ContinuousRouter {
    fn choose_route(&self, vehicle: &VehicleId, ctx: &ControlContext<'_>) -> Option<Vec<EdgeId>> {
        let state = ctx.vehicles.get(vehicle).ok()?;
        if !state.on_last_route_edge() {
            return None;
        }
        let edge = state.edge.as_ref()?;
        ctx.scenario.route_from(edge).map(<[EdgeId]>::to_vec)
    }
}
