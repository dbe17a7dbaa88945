//! `tc-vehicles` — the local entity cache.
//!
//! The engine is the source of truth for every vehicle and traffic signal.
//! Once per tick the control loop hands the latest subscription results to
//! [`VehicleStore::apply_snapshot`] and [`SignalStore::apply_snapshot`];
//! nothing else mutates engine-owned fields.  Commands issued to the engine
//! are intents and only show up here after the next snapshot.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`state`]   | `VehicleState`, `Color`                                     |
//! | [`store`]   | `VehicleStore`, `SnapshotDelta`                             |
//! | [`signals`] | `TrafficSignal`, `SignalStore`                              |
//! | [`error`]   | `StoreError`, `StoreResult<T>`                              |

pub mod error;
pub mod signals;
pub mod state;
pub mod store;


pub use error::{StoreError, StoreResult};
pub use signals::{SignalStore, TrafficSignal};
pub use state::{Color, VehicleState};
pub use store::{SnapshotDelta, VehicleStore};
