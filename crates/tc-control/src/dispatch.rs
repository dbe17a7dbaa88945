//! Turning control decisions into engine commands.

use tracing::{debug, warn};

use tc_core::{EdgeId, EnvParams, VehicleId};
use tc_engine::{Command, EngineError, ProtocolSession};
use tc_scenario::ScenarioView;
use tc_vehicles::VehicleStore;

use crate::controller::LaneChange;
use crate::{ControlError, ControlResult};

/// Applies acceleration, lane-change and routing decisions with the domain
/// clamps, one command per vehicle.
///
/// A command the engine rejects for a single vehicle is logged and skipped;
/// any other engine error aborts the phase.
#[derive(Clone, Debug)]
pub struct ControlDispatcher {
    /// Deceleration-override window of slow-down commands, in seconds.
    pub slow_down_window: f64,
    /// Lane hold duration of change-lane commands, in milliseconds.
    pub lane_change_hold_ms: u64,
}

impl Default for ControlDispatcher {
    fn default() -> Self {
        Self { slow_down_window: 1.0, lane_change_hold_ms: 100_000 }
    }
}

impl ControlDispatcher {
    pub fn from_params(params: &EnvParams) -> Self {
        Self {
            slow_down_window:    params.slow_down_window,
            lane_change_hold_ms: params.lane_change_hold_ms,
        }
    }

    /// Issue `max(speed + accel * step_length, 0)` as a slow-down target for
    /// each vehicle.
    pub fn apply_acceleration<S: ProtocolSession + ?Sized>(
        &self,
        session: &mut S,
        store: &VehicleStore,
        step_length: f64,
        actions: &[(VehicleId, f64)],
    ) -> ControlResult<()> {
        for (id, accel) in actions {
            let speed = store.speed(id)?;
            let next = (speed + accel * step_length).max(0.0);
            issue(session, id, Command::SlowDown { speed: next, duration: self.slow_down_window })?;
        }
        Ok(())
    }

    /// Issue lane changes and record the change time on the store.
    ///
    /// Every direction is validated before any command goes out.  Vehicles
    /// off the network, on unknown edges or on single-lane edges are
    /// skipped; targets are clamped to the edge's lanes and only issued when
    /// they differ from the current lane.  Returns the number of commands
    /// issued.
    pub fn apply_lane_change<S: ProtocolSession + ?Sized>(
        &self,
        session: &mut S,
        store: &mut VehicleStore,
        scenario: &dyn ScenarioView,
        time: f64,
        actions: &[(VehicleId, LaneChange)],
    ) -> ControlResult<usize> {
        for (id, change) in actions {
            if let LaneChange::Direction(d) = *change {
                if !(-1..=1).contains(&d) {
                    return Err(ControlError::InvalidDirection { vehicle: id.clone(), direction: d });
                }
            }
        }

        let mut issued = 0;
        for (id, change) in actions {
            let current = store.lane(id)?;
            let Some(edge) = store.edge(id)? else {
                debug!(vehicle = %id, "off network, lane change skipped");
                continue;
            };
            let lanes = match scenario.num_lanes(edge) {
                Some(n) if n > 1 => n,
                _ => continue,
            };
            let target = match *change {
                LaneChange::Target(lane) => lane.min(lanes - 1),
                LaneChange::Direction(d) => current.saturating_add_signed(d as isize).min(lanes - 1),
            };
            if target == current {
                continue;
            }
            let command = Command::ChangeLane { lane: target, duration_ms: self.lane_change_hold_ms };
            if issue(session, id, command)? {
                store.set_last_lane_change(id, time)?;
                issued += 1;
            }
        }
        Ok(issued)
    }

    /// Issue set-route commands.  `None` keeps the current route.
    ///
    /// Every route is checked against its vehicle's current edge before any
    /// command goes out.
    pub fn choose_routes<S: ProtocolSession + ?Sized>(
        &self,
        session: &mut S,
        store: &VehicleStore,
        actions: &[(VehicleId, Option<Vec<EdgeId>>)],
    ) -> ControlResult<()> {
        for (id, route) in actions {
            let Some(edges) = route else { continue };
            let current = store.edge(id)?;
            if edges.first() != current {
                return Err(ControlError::RouteStart {
                    vehicle: id.clone(),
                    first:   edges.first().cloned(),
                    current: current.cloned(),
                });
            }
        }

        for (id, route) in actions {
            let Some(edges) = route else { continue };
            issue(session, id, Command::SetRoute { edges: edges.clone() })?;
        }
        Ok(())
    }
}

/// Send one command.  `Ok(false)` means the engine rejected it for this
/// vehicle only.
fn issue<S: ProtocolSession + ?Sized>(
    session: &mut S,
    id: &VehicleId,
    command: Command,
) -> ControlResult<bool> {
    let kind = command.kind();
    match session.issue(id, command) {
        Ok(()) => Ok(true),
        Err(EngineError::Rejected { reason, .. }) => {
            warn!(vehicle = %id, command = kind, %reason, "engine rejected command");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
