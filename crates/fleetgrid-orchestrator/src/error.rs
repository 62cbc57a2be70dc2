//! Orchestrator error types.

use thiserror::Error;

/// Result type alias for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Errors that can occur talking to the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request could not be sent or timed out.
    #[error("orchestrator request failed: {0}")]
    Request(String),

    /// The orchestrator answered with a non-success status.
    #[error("orchestrator returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("unexpected orchestrator payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        OrchestratorError::Request(err.to_string())
    }
}
