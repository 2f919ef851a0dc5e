use crate::runtime::RuntimeError;
use crate::types::DbId;
use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// One entry per offending field, collected before any query runs.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Storage timeout or connection failure. Safe for the caller to retry.
    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FieldErrors> for CoreError {
    fn from(errors: FieldErrors) -> Self {
        CoreError::Validation(errors)
    }
}

impl From<RuntimeError> for CoreError {
    fn from(err: RuntimeError) -> Self {
        CoreError::InvalidFormat(err.to_string())
    }
}

/// A broken internal contract, e.g. a sort key that reached the query layer
/// without passing the safelist check.
///
/// Not a [`CoreError`] variant, so it cannot be handled as a user error. The
/// request path that produced it has to abort.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal invariant broken: {0}")]
pub struct InvariantViolation(pub String);
