//! Observer trait for progress reporting and data collection.

use crate::{EnvView, ExperimentReport, RolloutSummary, StepInfo};

/// Callbacks invoked by [`Experiment::run`][crate::Experiment::run] at
/// rollout and step boundaries.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl EnvObserver for Progress {
///     fn on_rollout_end(&mut self, summary: &RolloutSummary) {
///         println!("run {}: return {:.2}", summary.run, summary.total_reward);
///     }
/// }
/// ```
pub trait EnvObserver {
    /// Called after each reset, before the first step of rollout `run`.
    fn on_reset(&mut self, _run: usize, _view: &EnvView<'_>) {}

    /// Called after every step with the refreshed state.
    fn on_step_end(&mut self, _run: usize, _view: &EnvView<'_>, _reward: f64, _info: &StepInfo) {}

    fn on_rollout_end(&mut self, _summary: &RolloutSummary) {}

    /// Called once after the last rollout.
    fn on_experiment_end(&mut self, _report: &ExperimentReport) {}
}

/// An [`EnvObserver`] that does nothing.
pub struct NoopObserver;

impl EnvObserver for NoopObserver {}
