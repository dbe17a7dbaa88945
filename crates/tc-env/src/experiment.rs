//! Repeated rollouts with a fixed policy.

use tracing::info;

use tc_engine::{CommandLauncher, Connector, Launcher};
use tc_scenario::ScenarioView;

use crate::task::Task;
use crate::{Env, EnvObserver, EnvResult, EpisodeState};

/// Outcome of one rollout.
#[derive(Clone, Debug, PartialEq)]
pub struct RolloutSummary {
    pub run:          usize,
    pub steps:        u64,
    pub total_reward: f64,
    /// Mean over steps of the per-step mean vehicle speed.
    pub mean_speed:   f64,
    /// The rollout ended early on a teleport.
    pub crashed:      bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentReport {
    pub rollouts: Vec<RolloutSummary>,
}

impl ExperimentReport {
    pub fn returns(&self) -> Vec<f64> {
        self.rollouts.iter().map(|r| r.total_reward).collect()
    }

    pub fn mean_speeds(&self) -> Vec<f64> {
        self.rollouts.iter().map(|r| r.mean_speed).collect()
    }

    /// Average return over all rollouts, 0 for an empty report.
    pub fn mean_return(&self) -> f64 {
        if self.rollouts.is_empty() {
            return 0.0;
        }
        self.rollouts.iter().map(|r| r.total_reward).sum::<f64>() / self.rollouts.len() as f64
    }
}

/// Drives an [`Env`] through `num_runs` rollouts.
///
/// Each rollout resets the environment and steps until `done` or
/// `num_steps`.  The environment is started on the first run if needed and
/// is left running afterwards; call [`Env::terminate`] when finished.
pub struct Experiment<S, C, T, L = CommandLauncher>
where
    S: ScenarioView,
    C: Connector,
    T: Task,
    L: Launcher,
{
    env: Env<S, C, T, L>,
}

impl<S, C, T, L> Experiment<S, C, T, L>
where
    S: ScenarioView,
    C: Connector,
    T: Task,
    L: Launcher,
{
    pub fn new(env: Env<S, C, T, L>) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Env<S, C, T, L> {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env<S, C, T, L> {
        &mut self.env
    }

    pub fn into_env(self) -> Env<S, C, T, L> {
        self.env
    }

    pub fn run<P, O>(
        &mut self,
        num_runs: usize,
        num_steps: u64,
        mut policy: P,
        observer: &mut O,
    ) -> EnvResult<ExperimentReport>
    where
        P: FnMut(&T::Observation) -> T::Action,
        O: EnvObserver,
    {
        if self.env.state() == EpisodeState::Unstarted {
            self.env.start()?;
        }

        let mut report = ExperimentReport::default();
        for run in 0..num_runs {
            let mut observation = self.env.reset()?;
            observer.on_reset(run, &self.env.view());

            let mut summary = RolloutSummary {
                run,
                steps: 0,
                total_reward: 0.0,
                mean_speed: 0.0,
                crashed: false,
            };
            let mut speed_sum = 0.0;
            for _ in 0..num_steps {
                let action = policy(&observation);
                let result = self.env.step(&action)?;
                let view = self.env.view();
                speed_sum += view.mean_speed();
                summary.steps += 1;
                summary.total_reward += result.reward;
                observer.on_step_end(run, &view, result.reward, &result.info);
                observation = result.observation;
                if result.done {
                    summary.crashed = true;
                    break;
                }
            }
            if summary.steps > 0 {
                summary.mean_speed = speed_sum / summary.steps as f64;
            }

            info!(
                run,
                steps = summary.steps,
                total_reward = summary.total_reward,
                mean_speed = summary.mean_speed,
                crashed = summary.crashed,
                "rollout finished"
            );
            observer.on_rollout_end(&summary);
            report.rollouts.push(summary);
        }

        observer.on_experiment_end(&report);
        Ok(report)
    }
}
