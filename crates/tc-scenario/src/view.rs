//! The geometry interface consumed by the control loop.

use tc_core::EdgeId;

use crate::ScenarioResult;

/// One starting placement: an edge, a lane-relative position and a lane.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StartSlot {
    pub edge:     EdgeId,
    pub position: f64,
    pub lane:     usize,
}

/// Starting placements in slot order.
pub type StartingPositions = Vec<StartSlot>;

/// Read-only geometry and route provider.
///
/// Every edge lookup returns `None` for an edge the scenario does not know
/// (junction-internal edges, or the empty edge the engine reports for a
/// vehicle that is off the network).  Callers decide what "unknown" means
/// for them.
pub trait ScenarioView {
    /// Scenario name, used to name engine output files.
    fn name(&self) -> &str;

    /// Total length of the 1-D coordinate space in metres.
    fn length(&self) -> f64;

    fn edge_length(&self, edge: &EdgeId) -> Option<f64>;

    fn num_lanes(&self, edge: &EdgeId) -> Option<usize>;

    /// Map a lane-relative position on `edge` into the network's 1-D
    /// coordinate space.
    fn absolute_position(&self, edge: &EdgeId, position: f64) -> Option<f64>;

    /// Produce `count` placements starting at 1-D offset `x0`.
    fn generate_starting_positions(&self, count: usize, x0: f64)
        -> ScenarioResult<StartingPositions>;

    /// The scenario's named route beginning on `edge`, if any.
    fn route_from(&self, edge: &EdgeId) -> Option<&[EdgeId]>;
}
