//! Error types for the fleet registry.

use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The referenced server id is not in the registry.
    #[error("server not found: {0}")]
    NotFound(String),

    /// No registered server has a free player slot.
    #[error("no server with free capacity")]
    NoCapacity,

    /// The chosen server is at its advertised capacity.
    #[error("server full: {0}")]
    Full(String),

    /// Disconnect reported for a server whose player count is already zero.
    #[error("player count already zero: {0}")]
    Idle(String),
}
