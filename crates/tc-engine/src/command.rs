//! Fire-and-forget vehicle commands.

use tc_core::{EdgeId, RouteId, VehicleTypeId};

/// Placement of a vehicle inserted with [`Command::Add`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleSpawn {
    pub route:    RouteId,
    pub type_id:  VehicleTypeId,
    pub lane:     usize,
    pub position: f64,
    pub speed:    f64,
}

/// A command issued to one vehicle.  Commands express intent; the vehicle's
/// state only changes once the engine reports it in a later snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Reach `speed` within `duration` seconds, subject to the engine's own
    /// deceleration limits.
    SlowDown { speed: f64, duration: f64 },
    /// Move to `lane` and stay there for `duration_ms`.
    ChangeLane { lane: usize, duration_ms: u64 },
    /// Replace the route.  The first edge must be the vehicle's current edge.
    SetRoute { edges: Vec<EdgeId> },
    /// Insert a vehicle; it departs on the next tick.
    Add(VehicleSpawn),
    /// Take the vehicle off the network; it is reported as arrived next tick.
    Remove,
}

impl Command {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::SlowDown { .. }   => "slow_down",
            Command::ChangeLane { .. } => "change_lane",
            Command::SetRoute { .. }   => "set_route",
            Command::Add(_)            => "add",
            Command::Remove            => "remove",
        }
    }
}
