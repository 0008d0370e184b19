//! Grader Error Types
//!
//! Errors are internal to the evaluation pipeline: the public grading entry
//! points convert them into degraded zero-score results instead of
//! propagating them, so a flaky evaluation service can never block an
//! assignment from being graded.

/// Represents all error types that can occur while evaluating an answer.
#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    /// The evaluation service could not be reached or timed out.
    #[error("evaluation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service replied, but not with the expected structure.
    #[error("evaluation response malformed: {0}")]
    InvalidResponse(String),

    /// No API key is configured for the evaluation service.
    #[error("evaluation service API key is not configured")]
    MissingApiKey,
}
