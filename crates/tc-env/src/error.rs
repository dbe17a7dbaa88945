use tc_control::ControlError;
use tc_core::{CoreError, VehicleId};
use tc_engine::EngineError;
use tc_scenario::ScenarioError;
use tc_vehicles::StoreError;
use thiserror::Error;

use crate::EpisodeState;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("environment configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("only {departed} of {expected} roster vehicles departed at start")]
    RosterMismatch { expected: usize, departed: usize },

    #[error("roster vehicle {0} is not on the network after start")]
    MissingRosterVehicle(VehicleId),

    #[error("cannot {op} while the environment is {state}")]
    InvalidState {
        op:    &'static str,
        state: EpisodeState,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

pub type EnvResult<T> = Result<T, EnvError>;
