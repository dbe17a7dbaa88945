//! Per-episode display colors, one per vehicle type.

use rustc_hash::FxHashMap;

use tc_control::Roster;
use tc_core::{SimRng, VehicleTypeId};
use tc_vehicles::{Color, StoreResult, VehicleStore};

pub const PALETTE: [Color; 6] =
    [Color::RED, Color::GREEN, Color::YELLOW, Color::CYAN, Color::PURPLE, Color::WHITE];

/// Type → color mapping, rebuilt at every reset.
///
/// One random offset is drawn per episode; type `i` of the roster gets
/// `PALETTE[(offset + i + 1) % PALETTE.len()]`, so types within an episode
/// get distinct colors while the assignment rotates between episodes.
#[derive(Clone, Debug, Default)]
pub struct ColorTable {
    by_type: FxHashMap<VehicleTypeId, Color>,
}

impl ColorTable {
    pub fn new(roster: &Roster, rng: &mut SimRng) -> Self {
        let offset = rng.index(PALETTE.len());
        let by_type = roster
            .types()
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), PALETTE[(offset + i + 1) % PALETTE.len()]))
            .collect();
        Self { by_type }
    }

    pub fn color_for(&self, type_id: &VehicleTypeId) -> Option<Color> {
        self.by_type.get(type_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Color every tracked vehicle whose type is in the table.
    pub fn paint(&self, store: &mut VehicleStore) -> StoreResult<()> {
        let painted: Vec<_> = store
            .iter()
            .filter_map(|v| self.color_for(&v.type_id).map(|c| (v.id.clone(), c)))
            .collect();
        for (id, color) in painted {
            store.set_color(&id, color)?;
        }
        Ok(())
    }
}
