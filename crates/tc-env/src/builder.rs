//! Fluent builder for constructing an [`Env`].

use std::sync::Arc;

use tc_control::Roster;
use tc_core::{EngineParams, EnvParams};
use tc_engine::{CommandLauncher, Connector, Launcher};
use tc_scenario::ScenarioView;

use crate::task::Task;
use crate::{Env, EnvResult};

/// Fluent builder for [`Env<S, C, T, L>`].
///
/// # Required inputs
///
/// - `Arc<S>` where `S: ScenarioView`: the scenario geometry
/// - `C: Connector`: opens protocol sessions against a launched engine
/// - `T: Task`: actions, observation and reward
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                     |
/// |---------------------|-----------------------------|
/// | `.roster(r)`        | empty roster                |
/// | `.engine_params(p)` | `EngineParams::default()`   |
/// | `.env_params(p)`    | `EnvParams::default()`      |
/// | `.launcher(l)`      | `CommandLauncher`           |
///
/// # Example
///
/// ```rust,ignore
/// let mut env = EnvBuilder::new(scenario, connector, PassiveTask)
///     .roster(roster)
///     .engine_params(engine)
///     .env_params(EnvParams { sort_vehicles: true, ..EnvParams::default() })
///     .build()?;
/// env.start()?;
/// ```
pub struct EnvBuilder<S, C, T, L = CommandLauncher> {
    scenario:  Arc<S>,
    connector: C,
    task:      T,
    launcher:  L,
    roster:    Roster,
    engine:    EngineParams,
    env:       EnvParams,
}

impl<S, C, T> EnvBuilder<S, C, T, CommandLauncher>
where
    S: ScenarioView,
    C: Connector,
    T: Task,
{
    pub fn new(scenario: Arc<S>, connector: C, task: T) -> Self {
        Self {
            scenario,
            connector,
            task,
            launcher: CommandLauncher,
            roster:   Roster::new(),
            engine:   EngineParams::default(),
            env:      EnvParams::default(),
        }
    }
}

impl<S, C, T, L> EnvBuilder<S, C, T, L>
where
    S: ScenarioView,
    C: Connector,
    T: Task,
    L: Launcher,
{
    /// The initial population.  Start fails unless at least this many
    /// vehicles depart on the first tick.
    pub fn roster(mut self, roster: Roster) -> Self {
        self.roster = roster;
        self
    }

    pub fn engine_params(mut self, params: EngineParams) -> Self {
        self.engine = params;
        self
    }

    pub fn env_params(mut self, params: EnvParams) -> Self {
        self.env = params;
        self
    }

    /// Replace the process launcher.
    pub fn launcher<L2: Launcher>(self, launcher: L2) -> EnvBuilder<S, C, T, L2> {
        EnvBuilder {
            scenario:  self.scenario,
            connector: self.connector,
            task:      self.task,
            launcher,
            roster:    self.roster,
            engine:    self.engine,
            env:       self.env,
        }
    }

    /// Validate the parameters and return an unstarted [`Env`].
    pub fn build(self) -> EnvResult<Env<S, C, T, L>> {
        self.engine.validate()?;
        self.env.validate()?;
        Ok(Env::new(
            self.engine,
            self.env,
            self.launcher,
            self.connector,
            self.scenario,
            self.roster,
            self.task,
        ))
    }
}
