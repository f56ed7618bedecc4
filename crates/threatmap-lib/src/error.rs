use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the threatmap library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Only store-level failures are surfaced to callers of the evacuation
/// pipeline; collaborator errors are absorbed by the fallback paths.
#[derive(Debug, Error)]
pub enum Error {
    /// The persisted threat file exists but could not be parsed.
    #[error("threat store at {path} is corrupt: {message}")]
    CorruptStore { path: PathBuf, message: String },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the threat store")]
    ProjectDirsUnavailable,

    /// Raised when a threat record fails validation before insertion.
    #[error("invalid threat: {message}")]
    InvalidThreat { message: String },

    /// An external collaborator returned something unusable.
    #[error("{collaborator} collaborator failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// An external collaborator did not answer within the caller's deadline.
    #[error("{collaborator} collaborator timed out after {millis} ms")]
    CollaboratorTimeout {
        collaborator: &'static str,
        millis: u128,
    },

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Error::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}
