//! Shared error type for MeshKey crates

use thiserror::Error;

/// Result type alias using MeshKey's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all MeshKey modules
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument was rejected outright; no state mutated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid state: {0}
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration error: {0}
    #[error("configuration error: {0}")]
    Configuration(String),
}
