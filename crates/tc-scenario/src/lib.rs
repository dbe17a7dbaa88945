//! `tc-scenario` — read-only scenario geometry.
//!
//! The control loop never builds networks itself; it consumes a
//! [`ScenarioView`] produced elsewhere.  [`EdgeNetwork`] is the in-memory
//! implementation used by tests and the demo binary.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`view`]    | `ScenarioView` trait, `StartSlot`, `StartingPositions`      |
//! | [`network`] | `EdgeNetwork`, `EdgeNetworkBuilder`                         |
//! | [`error`]   | `ScenarioError`, `ScenarioResult<T>`                        |

pub mod error;
pub mod network;
pub mod view;


pub use error::{ScenarioError, ScenarioResult};
pub use network::{EdgeNetwork, EdgeNetworkBuilder};
pub use view::{ScenarioView, StartSlot, StartingPositions};
