//! One vehicle's cached state.

use std::fmt;

use tc_core::{EdgeId, VehicleId, VehicleTypeId};
use tc_engine::{Leader, VehicleFields};

/// RGBA display color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const RED:    Color = Color(255, 0, 0, 255);
    pub const GREEN:  Color = Color(0, 255, 0, 255);
    pub const YELLOW: Color = Color(255, 255, 0, 255);
    pub const CYAN:   Color = Color(0, 255, 255, 255);
    pub const PURPLE: Color = Color(255, 0, 255, 255);
    pub const WHITE:  Color = Color(255, 255, 255, 255);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.0, self.1, self.2, self.3)
    }
}

/// Everything the control loop knows about one vehicle.
///
/// Engine-owned fields are overwritten by every snapshot.  `max_speed`,
/// `last_lane_change` and `color` belong to the control loop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleState {
    pub id:                VehicleId,
    pub type_id:           VehicleTypeId,
    /// `None` while off the network.
    pub edge:              Option<EdgeId>,
    pub lane:              usize,
    pub lane_position:     f64,
    /// 1-D network coordinate, 0 while off the network.
    pub absolute_position: f64,
    pub speed:             f64,
    pub length:            f64,
    pub max_speed:         f64,
    pub leader:            Option<Leader>,
    pub route:             Vec<EdgeId>,
    /// Simulated time of the last commanded lane change, in seconds.
    pub last_lane_change:  f64,
    pub color:             Option<Color>,
}

impl VehicleState {
    pub(crate) fn from_fields(
        id: VehicleId,
        fields: &VehicleFields,
        absolute_position: f64,
        max_speed: f64,
        last_lane_change: f64,
    ) -> Self {
        Self {
            id,
            type_id: fields.type_id.clone(),
            edge: fields.edge.clone(),
            lane: fields.lane,
            lane_position: fields.lane_position,
            absolute_position,
            speed: fields.speed,
            length: fields.length,
            max_speed,
            leader: fields.leader.clone(),
            route: fields.route.clone(),
            last_lane_change,
            color: None,
        }
    }

    pub(crate) fn overwrite(&mut self, fields: &VehicleFields, absolute_position: f64) {
        self.type_id.clone_from(&fields.type_id);
        self.edge.clone_from(&fields.edge);
        self.lane = fields.lane;
        self.lane_position = fields.lane_position;
        self.absolute_position = absolute_position;
        self.speed = fields.speed;
        self.length = fields.length;
        self.leader.clone_from(&fields.leader);
        self.route.clone_from(&fields.route);
    }

    /// `true` while the vehicle has a network edge.
    #[inline]
    pub fn on_network(&self) -> bool {
        self.edge.is_some()
    }

    /// `true` if the vehicle is on the final edge of its route.
    pub fn on_last_route_edge(&self) -> bool {
        match (&self.edge, self.route.last()) {
            (Some(edge), Some(last)) => edge == last,
            _ => false,
        }
    }
}
