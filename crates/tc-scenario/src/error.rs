//! Scenario error type.

use thiserror::Error;

use tc_core::EdgeId;

/// Errors produced by `tc-scenario`.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("edge {0} defined twice")]
    DuplicateEdge(EdgeId),

    #[error("edge {edge} is invalid: {reason}")]
    InvalidEdge { edge: EdgeId, reason: String },

    #[error("edge {0} not found in scenario")]
    UnknownEdge(EdgeId),

    #[error("route for edge {0} does not start on that edge")]
    RouteStart(EdgeId),

    #[error("scenario has no edges to place {0} vehicles on")]
    EmptyNetwork(usize),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
