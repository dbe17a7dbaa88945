//! `tc-core` — foundational types for the `rust_tc` control loop.
//!
//! This crate is a dependency of every other `tc-*` crate.  It has no `tc-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`ids`]     | `VehicleId`, `VehicleTypeId`, `EdgeId`, `RouteId`, `SignalId` |
//! | [`time`]    | `EpisodeClock` (time counter + global step counter)         |
//! | [`rng`]     | `SimRng` (seeded, deterministic)                            |
//! | [`params`]  | `EngineParams`, `EnvParams`                                 |
//! | [`error`]   | `CoreError`, `CoreResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and params.          |

pub mod error;
pub mod ids;
pub mod params;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{EdgeId, RouteId, SignalId, VehicleId, VehicleTypeId};
pub use params::{EngineParams, EnvParams};
pub use rng::SimRng;
pub use time::EpisodeClock;
