//! `VehicleStore`: id-keyed vehicle records with a dense id list.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use tc_core::{EdgeId, VehicleId};
use tc_engine::{LifecycleEvents, VehicleFields};
use tc_scenario::ScenarioView;

use crate::state::{Color, VehicleState};
use crate::{StoreError, StoreResult};

/// Ids created and removed by one [`VehicleStore::apply_snapshot`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDelta {
    pub created: Vec<VehicleId>,
    pub removed: Vec<VehicleId>,
}

/// Authoritative local cache of every vehicle on the network.
///
/// Records live in a hash map for O(1) keyed access.  `order` is the store's
/// natural iteration order: ids in the order they were first seen, except
/// that a removal moves the last id into the freed slot so membership
/// changes stay O(1).  `slots` maps each id to its index in `order`.
pub struct VehicleStore {
    records:          FxHashMap<VehicleId, VehicleState>,
    order:            Vec<VehicleId>,
    slots:            FxHashMap<VehicleId, usize>,
    max_speed:        f64,
    lane_change_init: f64,
}

impl VehicleStore {
    /// `max_speed` and `lane_change_init` seed the corresponding fields of
    /// every record created from a snapshot.
    pub fn new(max_speed: f64, lane_change_init: f64) -> Self {
        Self {
            records: FxHashMap::default(),
            order: Vec::new(),
            slots: FxHashMap::default(),
            max_speed,
            lane_change_init,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &VehicleId) -> bool {
        self.records.contains_key(id)
    }

    /// Tracked ids in natural order.
    pub fn ids(&self) -> &[VehicleId] {
        &self.order
    }

    /// Records in natural order.
    pub fn iter(&self) -> impl Iterator<Item = &VehicleState> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn get(&self, id: &VehicleId) -> StoreResult<&VehicleState> {
        self.records.get(id).ok_or_else(|| StoreError::vehicle(id))
    }

    pub fn get_mut(&mut self, id: &VehicleId) -> StoreResult<&mut VehicleState> {
        self.records.get_mut(id).ok_or_else(|| StoreError::vehicle(id))
    }

    #[inline]
    pub fn speed(&self, id: &VehicleId) -> StoreResult<f64> {
        self.get(id).map(|v| v.speed)
    }

    #[inline]
    pub fn lane(&self, id: &VehicleId) -> StoreResult<usize> {
        self.get(id).map(|v| v.lane)
    }

    #[inline]
    pub fn edge(&self, id: &VehicleId) -> StoreResult<Option<&EdgeId>> {
        self.get(id).map(|v| v.edge.as_ref())
    }

    #[inline]
    pub fn absolute_position(&self, id: &VehicleId) -> StoreResult<f64> {
        self.get(id).map(|v| v.absolute_position)
    }

    // ── Control-loop owned fields ─────────────────────────────────────────

    pub fn set_last_lane_change(&mut self, id: &VehicleId, time: f64) -> StoreResult<()> {
        self.get_mut(id)?.last_lane_change = time;
        Ok(())
    }

    pub fn set_color(&mut self, id: &VehicleId, color: Color) -> StoreResult<()> {
        self.get_mut(id)?.color = Some(color);
        Ok(())
    }

    /// Set every record's last lane change to `time`, and use `time` for
    /// records created from now on.
    pub fn reset_lane_changes(&mut self, time: f64) {
        self.lane_change_init = time;
        for v in self.records.values_mut() {
            v.last_lane_change = time;
        }
    }

    // ── Membership ────────────────────────────────────────────────────────

    pub fn remove(&mut self, id: &VehicleId) -> Option<VehicleState> {
        let record = self.records.remove(id)?;
        if let Some(slot) = self.slots.remove(id) {
            self.order.swap_remove(slot);
            if let Some(moved) = self.order.get(slot) {
                self.slots.insert(moved.clone(), slot);
            }
        }
        Some(record)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
        self.slots.clear();
    }

    /// Fold one tick of engine output into the store.
    ///
    /// 1. Arrived ids are removed.
    /// 2. Departed ids not yet tracked are created, provided `fields` holds
    ///    their values.
    /// 3. Every tracked id is overwritten from `fields`.  A tracked id with no
    ///    fields has lost its subscription and is dropped.
    ///
    /// Absolute positions are always recomputed through `scenario`; a vehicle
    /// off the network or on an edge the scenario does not know sits at 0.
    pub fn apply_snapshot(
        &mut self,
        fields: &FxHashMap<VehicleId, VehicleFields>,
        events: &LifecycleEvents,
        scenario: &dyn ScenarioView,
    ) -> SnapshotDelta {
        let mut delta = SnapshotDelta::default();

        for id in &events.arrived {
            if self.remove(id).is_some() {
                delta.removed.push(id.clone());
            }
        }

        for id in &events.departed {
            if self.records.contains_key(id) {
                continue;
            }
            let Some(f) = fields.get(id) else {
                debug!(vehicle = %id, "departed without subscribed fields, not tracked yet");
                continue;
            };
            let x = absolute_position(scenario, f);
            let record =
                VehicleState::from_fields(id.clone(), f, x, self.max_speed, self.lane_change_init);
            self.records.insert(id.clone(), record);
            self.slots.insert(id.clone(), self.order.len());
            self.order.push(id.clone());
            delta.created.push(id.clone());
        }

        let mut stale = Vec::new();
        for id in &self.order {
            match (fields.get(id), self.records.get_mut(id)) {
                (Some(f), Some(record)) => {
                    let x = absolute_position(scenario, f);
                    record.overwrite(f, x);
                }
                _ => stale.push(id.clone()),
            }
        }
        for id in stale {
            warn!(vehicle = %id, "no snapshot fields for tracked vehicle, dropping it");
            self.remove(&id);
            delta.removed.push(id);
        }

        delta
    }

    /// Ids sorted by absolute position, ties kept in natural order.
    pub fn sorted_by_position(&self) -> Vec<VehicleId> {
        let mut ids = self.order.clone();
        ids.sort_by(|a, b| {
            let xa = self.records.get(a).map_or(0.0, |v| v.absolute_position);
            let xb = self.records.get(b).map_or(0.0, |v| v.absolute_position);
            xa.total_cmp(&xb)
        });
        ids
    }
}

fn absolute_position(scenario: &dyn ScenarioView, fields: &VehicleFields) -> f64 {
    fields
        .edge
        .as_ref()
        .and_then(|edge| scenario.absolute_position(edge, fields.lane_position))
        .unwrap_or(0.0)
}
