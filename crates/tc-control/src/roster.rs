//! Vehicle population and per-vehicle controller assignment.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use tc_core::{EdgeId, VehicleId, VehicleTypeId};

use crate::controller::{AccelerationController, LaneChange, LaneChangeController, RoutingController};
use crate::ControlContext;

// ── Controllers ───────────────────────────────────────────────────────────────

/// Zero or one controller per capability.
#[derive(Clone, Default)]
pub struct Controllers {
    pub acceleration: Option<Arc<dyn AccelerationController>>,
    pub lane_change:  Option<Arc<dyn LaneChangeController>>,
    pub routing:      Option<Arc<dyn RoutingController>>,
}

impl Controllers {
    /// No controllers: the engine's own models drive the vehicle.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_acceleration(mut self, c: impl AccelerationController) -> Self {
        self.acceleration = Some(Arc::new(c));
        self
    }

    pub fn with_lane_change(mut self, c: impl LaneChangeController) -> Self {
        self.lane_change = Some(Arc::new(c));
        self
    }

    pub fn with_routing(mut self, c: impl RoutingController) -> Self {
        self.routing = Some(Arc::new(c));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.acceleration.is_none() && self.lane_change.is_none() && self.routing.is_none()
    }
}

impl fmt::Debug for Controllers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controllers")
            .field("acceleration", &self.acceleration.is_some())
            .field("lane_change", &self.lane_change.is_some())
            .field("routing", &self.routing.is_some())
            .finish()
    }
}

// ── Roster ────────────────────────────────────────────────────────────────────

/// One vehicle type of the initial population.
#[derive(Clone, Debug)]
pub struct VehicleType {
    pub id:          VehicleTypeId,
    pub count:       usize,
    pub controllers: Controllers,
}

/// The initial population, grouped by type.
///
/// Vehicle `i` of type `t` is named `t_i`; [`ids`](Self::ids) lists them in
/// type order.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    types: Vec<VehicleType>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        mut self,
        id: impl Into<VehicleTypeId>,
        count: usize,
        controllers: Controllers,
    ) -> Self {
        self.types.push(VehicleType { id: id.into(), count, controllers });
        self
    }

    pub fn types(&self) -> &[VehicleType] {
        &self.types
    }

    /// Total number of vehicles.
    pub fn len(&self) -> usize {
        self.types.iter().map(|t| t.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<VehicleId> {
        self.ids_with_types().into_iter().map(|(id, _)| id).collect()
    }

    pub fn ids_with_types(&self) -> Vec<(VehicleId, VehicleTypeId)> {
        self.types
            .iter()
            .flat_map(|t| (0..t.count).map(move |i| (VehicleId::for_roster(&t.id, i), t.id.clone())))
            .collect()
    }

    pub fn controllers_for(&self, type_id: &VehicleTypeId) -> Option<&Controllers> {
        self.types.iter().find(|t| &t.id == type_id).map(|t| &t.controllers)
    }
}

// ── Assignments ───────────────────────────────────────────────────────────────

/// The controllers bound to each tracked vehicle.
///
/// Filled when a vehicle is first tracked, from its type.  Vehicles of types
/// not in the roster (engine-inserted traffic) get no controllers.
#[derive(Default)]
pub struct Assignments {
    by_vehicle: FxHashMap<VehicleId, Controllers>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, id: &VehicleId, type_id: &VehicleTypeId, roster: &Roster) {
        let controllers = roster.controllers_for(type_id).cloned().unwrap_or_default();
        self.by_vehicle.insert(id.clone(), controllers);
    }

    pub fn remove(&mut self, id: &VehicleId) {
        self.by_vehicle.remove(id);
    }

    pub fn clear(&mut self) {
        self.by_vehicle.clear();
    }

    pub fn get(&self, id: &VehicleId) -> Option<&Controllers> {
        self.by_vehicle.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_vehicle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_vehicle.is_empty()
    }

    /// Acceleration decisions for every controlled vehicle, in store order.
    pub fn accelerations(&self, ctx: &ControlContext<'_>) -> Vec<(VehicleId, f64)> {
        ctx.vehicles
            .ids()
            .iter()
            .filter_map(|id| {
                let c = self.by_vehicle.get(id)?.acceleration.as_ref()?;
                c.get_accel(id, ctx).map(|a| (id.clone(), a))
            })
            .collect()
    }

    pub fn lane_changes(&self, ctx: &ControlContext<'_>) -> Vec<(VehicleId, LaneChange)> {
        ctx.vehicles
            .ids()
            .iter()
            .filter_map(|id| {
                let c = self.by_vehicle.get(id)?.lane_change.as_ref()?;
                c.get_lane_change(id, ctx).map(|lc| (id.clone(), lc))
            })
            .collect()
    }

    /// Routing decisions for every vehicle with a router; `None` keeps the
    /// current route.
    pub fn routes(&self, ctx: &ControlContext<'_>) -> Vec<(VehicleId, Option<Vec<EdgeId>>)> {
        ctx.vehicles
            .ids()
            .iter()
            .filter_map(|id| {
                let c = self.by_vehicle.get(id)?.routing.as_ref()?;
                Some((id.clone(), c.choose_route(id, ctx)))
            })
            .collect()
    }
}
