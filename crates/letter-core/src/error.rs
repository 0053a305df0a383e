//! Error types for letter-core

use thiserror::Error;

/// Result type alias for letter-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// A required blackboard entry was never written
    #[error("Missing context entry: {0}")]
    MissingContext(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),
}
