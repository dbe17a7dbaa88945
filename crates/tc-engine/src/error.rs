//! Engine boundary error type.

use thiserror::Error;

/// Errors produced by `tc-engine`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine never became reachable within the launch budget.
    #[error("engine failed to start after {attempts} attempts: {source}")]
    Launch {
        attempts: u32,
        #[source]
        source: Box<EngineError>,
    },

    /// No connection could be established within the retry budget.
    #[error("could not connect to engine on port {port} after {attempts} attempts: {reason}")]
    Connection { port: u16, attempts: u32, reason: String },

    /// The engine rejected a per-entity command or query.
    #[error("engine rejected command for {id}: {reason}")]
    Rejected { id: String, reason: String },

    /// The session was closed, or belongs to an engine that has since been
    /// restarted.
    #[error("protocol session is closed")]
    Closed,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn rejected(id: impl ToString, reason: impl Into<String>) -> Self {
        EngineError::Rejected { id: id.to_string(), reason: reason.into() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
