//! Traffic-signal cache.

use rustc_hash::FxHashMap;

use tc_core::SignalId;
use tc_engine::SignalFields;

use crate::{StoreError, StoreResult};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficSignal {
    pub id:      SignalId,
    pub state:   String,
    pub program: String,
}

/// Signals are created the first time they are observed and never removed
/// within an episode.
#[derive(Default)]
pub struct SignalStore {
    records: FxHashMap<SignalId, TrafficSignal>,
    order:   Vec<SignalId>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[SignalId] {
        &self.order
    }

    pub fn get(&self, id: &SignalId) -> StoreResult<&TrafficSignal> {
        self.records.get(id).ok_or_else(|| StoreError::signal(id))
    }

    pub fn state(&self, id: &SignalId) -> StoreResult<&str> {
        self.get(id).map(|s| s.state.as_str())
    }

    /// Register a known signal before its first snapshot.
    pub fn observe(&mut self, id: &SignalId) {
        if !self.records.contains_key(id) {
            self.records.insert(id.clone(), TrafficSignal {
                id:      id.clone(),
                state:   String::new(),
                program: String::new(),
            });
            self.order.push(id.clone());
        }
    }

    pub fn apply_snapshot(&mut self, fields: &FxHashMap<SignalId, SignalFields>) {
        for (id, f) in fields {
            self.observe(id);
            if let Some(signal) = self.records.get_mut(id) {
                signal.state.clone_from(&f.state);
                signal.program.clone_from(&f.program);
            }
        }
    }
}
