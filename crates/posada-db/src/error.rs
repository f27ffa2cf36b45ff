use thiserror::Error;

/// Storage-layer error type. Every variant except `Sqlite` and `Internal`
/// is a recoverable validation failure surfaced to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Bad date ordering or a start date in the past
    #[error("{0}")]
    DateRange(String),

    /// An overlapping blocking reservation exists
    #[error("{0}")]
    Conflict(String),

    /// Lifecycle transition attempted from the wrong status
    #[error("{0}")]
    State(String),

    /// Unknown identifier
    #[error("{0}")]
    NotFound(String),

    /// Unique-constraint collision (room number, username)
    #[error("{0}")]
    Duplicate(String),

    /// Underlying database failure
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Invariant breakage inside the store itself
    #[error("internal store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
