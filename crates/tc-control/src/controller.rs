//! Controller capability traits: the extension points for user code.
//!
//! A vehicle type carries zero or one controller per capability.  Each trait
//! has a single decision method; returning `None` means "no action this
//! step".
//!
//! # Thread safety
//!
//! Controllers are shared between every vehicle of a type through `Arc`, so
//! implementations must be `Send + Sync`.  Per-vehicle state belongs in the
//! vehicle store, not in the controller.

use tc_core::{EdgeId, VehicleId};

use crate::ControlContext;

/// Decides a longitudinal acceleration in m/s².
pub trait AccelerationController: Send + Sync + 'static {
    fn get_accel(&self, vehicle: &VehicleId, ctx: &ControlContext<'_>) -> Option<f64>;
}

/// A lane-change request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LaneChange {
    /// Move to this lane index.
    Target(usize),
    /// Move one lane left (`1`), right (`-1`), or stay (`0`).  Any other
    /// value is rejected by the dispatcher.
    Direction(i32),
}

pub trait LaneChangeController: Send + Sync + 'static {
    fn get_lane_change(&self, vehicle: &VehicleId, ctx: &ControlContext<'_>) -> Option<LaneChange>;
}

/// Picks a new route.  The route must begin with the vehicle's current edge.
pub trait RoutingController: Send + Sync + 'static {
    fn choose_route(&self, vehicle: &VehicleId, ctx: &ControlContext<'_>) -> Option<Vec<EdgeId>>;
}
