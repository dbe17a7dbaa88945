use thiserror::Error;

use tc_core::{EdgeId, VehicleId};
use tc_engine::EngineError;
use tc_vehicles::StoreError;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("lane-change direction for {vehicle} must be -1, 0 or 1, got {direction}")]
    InvalidDirection { vehicle: VehicleId, direction: i32 },

    #[error("route for {vehicle} starts on {first:?} but the vehicle is on {current:?}")]
    RouteStart {
        vehicle: VehicleId,
        first:   Option<EdgeId>,
        current: Option<EdgeId>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type ControlResult<T> = Result<T, ControlError>;
