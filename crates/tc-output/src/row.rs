//! Plain data row types written by output backends.

use tc_vehicles::VehicleState;

/// One vehicle's state after a step.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleStateRow {
    pub run:               usize,
    pub time_counter:      u64,
    pub time_secs:         f64,
    pub vehicle_id:        String,
    pub type_id:           String,
    /// Empty while the vehicle is off the network.
    pub edge:              String,
    pub lane:              usize,
    pub lane_position:     f64,
    pub absolute_position: f64,
    pub speed:             f64,
    /// Empty when no leader is within the lookahead.
    pub leader_id:         String,
    pub leader_gap:        Option<f64>,
}

impl VehicleStateRow {
    pub fn from_state(run: usize, time_counter: u64, time_secs: f64, v: &VehicleState) -> Self {
        Self {
            run,
            time_counter,
            time_secs,
            vehicle_id:        v.id.to_string(),
            type_id:           v.type_id.to_string(),
            edge:              v.edge.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            lane:              v.lane,
            lane_position:     v.lane_position,
            absolute_position: v.absolute_position,
            speed:             v.speed,
            leader_id:         v.leader.as_ref().map(|l| l.id.to_string()).unwrap_or_default(),
            leader_gap:        v.leader.as_ref().map(|l| l.gap),
        }
    }
}

/// Aggregates for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummaryRow {
    pub run:          usize,
    pub time_counter: u64,
    pub time_secs:    f64,
    pub vehicles:     usize,
    pub mean_speed:   f64,
    pub reward:       f64,
    pub crashed:      bool,
}
