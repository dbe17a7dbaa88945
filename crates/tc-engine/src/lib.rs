//! `tc-engine` — the boundary to the external simulation engine.
//!
//! Two halves:
//!
//! - **Process supervision**: [`ProcessSupervisor`] launches the engine
//!   binary in its own process group on a free port, waits for it to settle,
//!   connects, performs the handshake tick, and kills the whole process group
//!   on failure or shutdown.
//! - **Protocol session**: [`ProtocolSession`] is the synchronous client the
//!   control loop talks to once connected.  The wire encoding lives behind
//!   this trait; [`Connector`] produces sessions for a port.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`fields`]  | `VehicleVar`, `VehicleFields`, `SignalFields`, `StepSnapshot` |
//! | [`command`] | `Command`, `VehicleSpawn`                                   |
//! | [`session`] | `ProtocolSession`, `Connector`, `connect_with_retries`      |
//! | [`process`] | `EngineCommand`, `Launcher`, `CommandLauncher`, `ProcessSupervisor` |
//! | [`mock`]    | `MockEngine` (feature = `"test-helpers"` only)              |
//! | [`error`]   | `EngineError`, `EngineResult<T>`                            |

pub mod command;
pub mod error;
pub mod fields;
pub mod process;
pub mod session;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;


pub use command::{Command, VehicleSpawn};
pub use error::{EngineError, EngineResult};
pub use fields::{LifecycleEvents, Leader, SignalFields, StepSnapshot, VehicleFields, VehicleVar};
pub use process::{CommandLauncher, EngineCommand, EngineHandle, Launcher, ProcessSupervisor, free_port};
pub use session::{Connector, ProtocolSession, connect_with_retries};
