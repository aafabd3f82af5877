//! Error types for guardian-core.

use thiserror::Error;

/// Result type alias using guardian-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for guardian operations.
///
/// None of these are fatal to the process: a failed refresh keeps the
/// previous snapshot, a failed turn appends an inline error message.
#[derive(Error, Debug)]
pub enum Error {
    // Data backend errors
    #[error("Fetch failed for {resource}: {reason}")]
    Fetch { resource: String, reason: String },

    // Agent backend errors
    #[error("Session creation failed: {0}")]
    Session(String),

    #[error("Send failed: {0}")]
    Send(String),

    // Transport errors
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create an error for a failed data backend fetch
    pub fn fetch(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}
