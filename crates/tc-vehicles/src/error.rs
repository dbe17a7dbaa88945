use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup of an id the store does not track.  Always a caller bug.
    #[error("unknown {kind} {id}")]
    UnknownEntity { kind: &'static str, id: String },
}

impl StoreError {
    pub(crate) fn vehicle(id: impl ToString) -> Self {
        StoreError::UnknownEntity { kind: "vehicle", id: id.to_string() }
    }

    pub(crate) fn signal(id: impl ToString) -> Self {
        StoreError::UnknownEntity { kind: "traffic signal", id: id.to_string() }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
