//! Error types for guardian.

use thiserror::Error;

/// CLI-level errors.
#[derive(Error, Debug)]
pub enum GuardianError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    #[error("Entity not locatable: {0}")]
    NotLocatable(String),

    #[error("Core error: {0}")]
    Core(#[from] guardian_core::Error),
}

/// Result type alias for guardian operations.
pub type GuardianResult<T> = Result<T, GuardianError>;
