use sea_orm::DbErr;

/// Result type for engine operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors that can occur in the lifecycle engine.
///
/// Degraded subjective grading is deliberately absent: it is recorded on
/// the submission and the question grade, not raised as an error.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A referenced entity does not exist. Always surfaced, never ignored.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A state machine rule or attempts guard was violated.
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Caller-supplied parameters failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The store was unreachable or rejected an operation. Propagated to
    /// the caller for retry; the engine performs no implicit retries.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ServiceError::NotFound { entity, id }
    }

    pub fn invalid_transition(
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        ServiceError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }
}
