//! Engine error taxonomy. Every mutating operation rejects invalid input
//! before touching state; conflicts and missing rows surface as typed
//! variants so callers can branch without string matching.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input (non-positive amount, bad identifier). Nothing was mutated.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced row does not exist. Nothing was mutated.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: i64 },

    /// The operation is not legal in the row's current state (terminal quest,
    /// expired window, missing cooperative confirmation, lost optimistic race).
    /// No XP was applied.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// Caller presented no authenticated user. Short-circuits before persistence.
    #[error("caller is not authenticated")]
    Unauthenticated,

    /// Persistence failure. Fatal for the current call; the whole logical
    /// operation is safe to retry from stored state.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
