//! Placement of the roster vehicles at the start of an episode.

use tc_core::{EdgeId, RouteId, VehicleId, VehicleTypeId};
use tc_engine::{ProtocolSession, VehicleSpawn};
use tc_scenario::{ScenarioView, StartSlot};
use tc_vehicles::VehicleStore;

use crate::{EnvError, EnvResult};

/// Everything needed to re-insert one vehicle on reset.
#[derive(Clone, Debug, PartialEq)]
pub struct InitialVehicle {
    pub id:                VehicleId,
    pub type_id:           VehicleTypeId,
    pub route:             RouteId,
    pub edge:              EdgeId,
    pub lane:              usize,
    /// Lane-relative position on `edge`.
    pub position:          f64,
    pub speed:             f64,
    pub absolute_position: f64,
}

impl InitialVehicle {
    pub fn spawn(&self) -> VehicleSpawn {
        VehicleSpawn {
            route:    self.route.clone(),
            type_id:  self.type_id.clone(),
            lane:     self.lane,
            position: self.position,
            speed:    self.speed,
        }
    }
}

/// Starting placement of every roster vehicle, in roster order.
///
/// Captured once after the first successful start.  Vehicles the engine
/// inserts on its own never appear here.
#[derive(Clone, Debug, Default)]
pub struct InitialState {
    entries: Vec<InitialVehicle>,
}

impl InitialState {
    /// Record the current placement of each id in `roster_ids`.
    ///
    /// Every roster id must be tracked by `store` and on the network.
    pub fn capture<P: ProtocolSession + ?Sized>(
        session: &mut P,
        store: &VehicleStore,
        roster_ids: &[VehicleId],
    ) -> EnvResult<Self> {
        let mut entries = Vec::with_capacity(roster_ids.len());
        for id in roster_ids {
            let missing = || EnvError::MissingRosterVehicle(id.clone());
            let state = store.get(id).map_err(|_| missing())?;
            let edge = state.edge.clone().ok_or_else(missing)?;
            entries.push(InitialVehicle {
                id: id.clone(),
                type_id: state.type_id.clone(),
                route: session.route_id(id)?,
                edge,
                lane: state.lane,
                position: state.lane_position,
                speed: state.speed,
                absolute_position: state.absolute_position,
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<VehicleId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InitialVehicle> + '_ {
        self.entries.iter()
    }

    pub fn get(&self, id: &VehicleId) -> Option<&InitialVehicle> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Give `order[i]` the placement `slots[i]`.
    ///
    /// Route, edge, lane and positions are overwritten; type and speed are
    /// kept.  The route becomes the scenario route named after the slot's
    /// edge.  Ids not in the state are ignored.
    pub fn rearrange(&mut self, order: &[VehicleId], slots: &[StartSlot], scenario: &dyn ScenarioView) {
        for (id, slot) in order.iter().zip(slots) {
            let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) else {
                continue;
            };
            entry.route = RouteId::for_edge(&slot.edge);
            entry.edge = slot.edge.clone();
            entry.lane = slot.lane;
            entry.position = slot.position;
            entry.absolute_position =
                scenario.absolute_position(&slot.edge, slot.position).unwrap_or(0.0);
        }
    }
}
