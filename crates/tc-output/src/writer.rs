//! The `OutputWriter` trait implemented by all backend writers.

use crate::{OutputResult, StepSummaryRow, VehicleStateRow};

/// Sink for per-step vehicle states and step summaries.
///
/// Errors surface to the observer, which keeps the first one for
/// [`EnvOutputObserver::take_error`][crate::EnvOutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of vehicle states.
    fn write_vehicle_states(&mut self, rows: &[VehicleStateRow]) -> OutputResult<()>;

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
