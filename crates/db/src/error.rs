use marquee_core::error::{CoreError, InvariantViolation};

/// Errors surfaced by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic-locking check failed: the row changed since it was read.
    #[error("edit conflict")]
    EditConflict,

    /// The storage call did not finish within the configured bound.
    #[error("storage call timed out")]
    Timeout,

    /// A query was about to run with parameters that should have been
    /// rejected by validation. Not recoverable.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Timeout
                | StoreError::Database(
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
        )
    }

    /// Map to the domain taxonomy. Invariant breaches are excluded: they have
    /// no `CoreError` counterpart and must be handled by the caller.
    pub fn into_core(self) -> Result<CoreError, InvariantViolation> {
        if self.is_transient() {
            return Ok(CoreError::Transient(self.to_string()));
        }
        match self {
            StoreError::EditConflict => Ok(CoreError::Conflict(
                "unable to update the record due to an edit conflict, please try again".into(),
            )),
            StoreError::Invariant(violation) => Err(violation),
            other => Ok(CoreError::Internal(other.to_string())),
        }
    }
}
