//! Subscription results returned by the engine each tick.

use rustc_hash::FxHashMap;

use tc_core::{EdgeId, SignalId, VehicleId, VehicleTypeId};

/// Per-vehicle variables that can be subscribed to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleVar {
    TypeId,
    Edge,
    Lane,
    LanePosition,
    Speed,
    Length,
    Route,
}

impl VehicleVar {
    /// Every variable the vehicle store needs for a complete record.
    pub const ALL: [VehicleVar; 7] = [
        VehicleVar::TypeId,
        VehicleVar::Edge,
        VehicleVar::Lane,
        VehicleVar::LanePosition,
        VehicleVar::Speed,
        VehicleVar::Length,
        VehicleVar::Route,
    ];
}

/// The closest vehicle ahead within the subscribed lookahead.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Leader {
    pub id:  VehicleId,
    /// Bumper-to-bumper distance in metres.
    pub gap: f64,
}

/// Latest subscribed values for one vehicle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleFields {
    pub type_id:       VehicleTypeId,
    /// `None` while the vehicle is off the network (teleporting).
    pub edge:          Option<EdgeId>,
    pub lane:          usize,
    pub lane_position: f64,
    pub speed:         f64,
    pub length:        f64,
    pub route:         Vec<EdgeId>,
    /// Only present when a leader subscription exists for the vehicle.
    pub leader:        Option<Leader>,
}

/// Latest subscribed values for one traffic signal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalFields {
    /// Per-link phase string, e.g. `"GrGr"`.
    pub state:   String,
    pub program: String,
}

/// Simulation-level id lists for the last tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LifecycleEvents {
    pub departed:          Vec<VehicleId>,
    pub arrived:           Vec<VehicleId>,
    pub teleport_starting: Vec<VehicleId>,
}

impl LifecycleEvents {
    /// `true` if any vehicle began teleporting, the engine's collision signal.
    #[inline]
    pub fn collision(&self) -> bool {
        !self.teleport_starting.is_empty()
    }
}

/// Everything `collect()` returns after a tick.
#[derive(Clone, Debug, Default)]
pub struct StepSnapshot {
    pub vehicles: FxHashMap<VehicleId, VehicleFields>,
    pub signals:  FxHashMap<SignalId, SignalFields>,
    pub events:   LifecycleEvents,
}
