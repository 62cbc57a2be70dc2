//! Sampler error types.

use thiserror::Error;

/// Per-instance probe failures. Collected by id, never fatal for a
/// sampling batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SampleError {
    /// TCP connect or HTTP handshake failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The request could not be completed.
    #[error("request failed: {0}")]
    Request(String),

    /// The status endpoint answered with a non-success status.
    #[error("status endpoint returned {0}")]
    Status(u16),

    /// The response body was not a player count.
    #[error("unparseable player count: {0:?}")]
    Parse(String),

    /// The whole exchange exceeded the probe timeout.
    #[error("probe timed out")]
    Timeout,
}
