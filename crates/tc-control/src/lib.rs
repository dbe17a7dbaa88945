//! `tc-control` — controller traits and the command dispatcher.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`controller`] | `AccelerationController`, `LaneChangeController`, `RoutingController`, `LaneChange` |
//! | [`builtin`]    | `ConstantAccel`, `TargetSpeed`, `FixedLane`, `ContinuousRouter` |
//! | [`context`]    | `ControlContext<'a>`, the read-only view given to controllers |
//! | [`roster`]     | `Roster`, `VehicleType`, `Controllers`, `Assignments`     |
//! | [`dispatch`]   | `ControlDispatcher`                                       |
//! | [`error`]      | `ControlError`, `ControlResult<T>`                        |
//!
//! # Design notes
//!
//! Each step has a decide phase and an issue phase.  Controllers only see
//! `&ControlContext` and return plain values; [`Assignments`] gathers those
//! decisions for every controlled vehicle.  The dispatcher then turns them
//! into engine commands, applying the domain clamps (non-negative speed,
//! valid lane range).  Keeping the phases apart lets the dispatcher update
//! control-loop fields on the store without aliasing the context borrow.

pub mod builtin;
pub mod context;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod roster;


pub use builtin::{ConstantAccel, ContinuousRouter, FixedLane, TargetSpeed};
pub use context::ControlContext;
pub use controller::{AccelerationController, LaneChange, LaneChangeController, RoutingController};
pub use dispatch::ControlDispatcher;
pub use error::{ControlError, ControlResult};
pub use roster::{Assignments, Controllers, Roster, VehicleType};
