//! `tc-output` — trajectory output writers for the rust_tc control loop.
//!
//! | Backend | Files created                                  |
//! |---------|------------------------------------------------|
//! | CSV     | `vehicle_states.csv`, `step_summaries.csv`     |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`EnvOutputObserver`], which implements `tc_env::EnvObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tc_output::{CsvWriter, EnvOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = EnvOutputObserver::new(writer).with_state_interval(10);
//! experiment.run(1, 1_500, |_| (), &mut obs)?;
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::EnvOutputObserver;
pub use row::{StepSummaryRow, VehicleStateRow};
pub use writer::OutputWriter;
