//! `tc-env` — episode manager for the rust_tc control loop.
//!
//! # Step loop
//!
//! ```text
//! Env::step(action):
//!   ① Counters      — time counter and global step counter advance; past
//!                     the restart threshold the engine process is replaced.
//!   ② Decide        — roster controllers produce acceleration, lane-change
//!                     and routing decisions from a read-only context.
//!   ③ Dispatch      — decisions become engine commands (clamped), then the
//!                     task applies the caller's action.
//!   ④ Advance       — the engine performs exactly one tick.
//!   ⑤ Refresh       — newly departed vehicles are subscribed and the stores
//!                     fold in the tick's subscription results.
//!   ⑥ Result        — sorted ids, observation, reward, and `done` when a
//!                     vehicle started teleporting.
//! ```
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`env`]        | `Env`, `EpisodeState`, `StepResult`, `StepInfo`          |
//! | [`builder`]    | `EnvBuilder`                                             |
//! | [`task`]       | `Task`, `ActionApi`, `EnvView`, `PassiveTask`            |
//! | [`initial`]    | `InitialState`, `InitialVehicle`                         |
//! | [`colors`]     | `ColorTable`, `PALETTE`                                  |
//! | [`observer`]   | `EnvObserver`, `NoopObserver`                            |
//! | [`experiment`] | `Experiment`, `ExperimentReport`, `RolloutSummary`       |
//! | [`error`]      | `EnvError`, `EnvResult<T>`                               |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tc_control::{Controllers, Roster, TargetSpeed};
//! use tc_env::{EnvBuilder, NoopObserver, Experiment, PassiveTask};
//!
//! let roster = Roster::new()
//!     .add("human", 20, Controllers::none().with_acceleration(TargetSpeed::new(8.0)));
//! let mut env = EnvBuilder::new(scenario, connector, PassiveTask)
//!     .roster(roster)
//!     .build()?;
//! env.start()?;
//! let report = Experiment::new(env).run(1, 1_500, |_| (), &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod colors;
pub mod env;
pub mod error;
pub mod experiment;
pub mod initial;
pub mod observer;
pub mod task;

#[cfg(test)]
mod tests;

pub use builder::EnvBuilder;
pub use colors::{ColorTable, PALETTE};
pub use env::{Env, EpisodeState, StepInfo, StepResult};
pub use error::{EnvError, EnvResult};
pub use experiment::{Experiment, ExperimentReport, RolloutSummary};
pub use initial::{InitialState, InitialVehicle};
pub use observer::{NoopObserver, EnvObserver};
pub use task::{ActionApi, EnvView, PassiveTask, Task};
