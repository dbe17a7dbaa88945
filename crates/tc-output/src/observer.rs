//! `EnvOutputObserver<W>` bridges `EnvObserver` to an `OutputWriter`.

use tc_env::{EnvObserver, EnvView, ExperimentReport, StepInfo};

use crate::row::{StepSummaryRow, VehicleStateRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// An [`EnvObserver`] that writes vehicle states and step summaries to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `EnvObserver`
/// methods have no return value.  After the experiment returns, check for
/// errors with [`take_error`][Self::take_error].
pub struct EnvOutputObserver<W: OutputWriter> {
    writer:         W,
    state_interval: u64,
    last_error:     Option<OutputError>,
}

impl<W: OutputWriter> EnvOutputObserver<W> {
    /// Record every vehicle after every step.
    pub fn new(writer: W) -> Self {
        Self { writer, state_interval: 1, last_error: None }
    }

    /// Record vehicle states every `interval` steps (and on reset).
    /// `0` disables vehicle states; summaries are always written.
    pub fn with_state_interval(mut self, interval: u64) -> Self {
        self.state_interval = interval;
        self
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write_states(&mut self, run: usize, view: &EnvView<'_>) {
        let time_counter = view.clock.time_counter;
        let time_secs = view.clock.elapsed_secs();
        let rows: Vec<VehicleStateRow> = view
            .vehicles
            .iter()
            .map(|v| VehicleStateRow::from_state(run, time_counter, time_secs, v))
            .collect();
        if !rows.is_empty() {
            let result = self.writer.write_vehicle_states(&rows);
            self.store_err(result);
        }
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> EnvObserver for EnvOutputObserver<W> {
    fn on_reset(&mut self, run: usize, view: &EnvView<'_>) {
        if self.state_interval > 0 {
            self.write_states(run, view);
        }
    }

    fn on_step_end(&mut self, run: usize, view: &EnvView<'_>, reward: f64, info: &StepInfo) {
        if self.state_interval > 0 && info.time_counter.is_multiple_of(self.state_interval) {
            self.write_states(run, view);
        }
        let row = StepSummaryRow {
            run,
            time_counter: info.time_counter,
            time_secs:    view.clock.elapsed_secs(),
            vehicles:     view.vehicles.len(),
            mean_speed:   view.mean_speed(),
            reward,
            crashed:      info.crashed,
        };
        let result = self.writer.write_step_summary(&row);
        self.store_err(result);
    }

    fn on_experiment_end(&mut self, _report: &ExperimentReport) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
