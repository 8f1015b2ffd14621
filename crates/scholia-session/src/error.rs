//! Error types for the session layer.

use scholia_models::ModelError;
use scholia_sdk::{ErrorKind, SdkError};

use crate::transform::TransformOp;

/// Failure reading or writing persisted credentials.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// File system failure.
    #[error("credential storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry exists but cannot be decoded.
    #[error("stored identity is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// No storage location could be determined.
    #[error("no configuration directory available for credential storage")]
    NoLocation,
}

/// Error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Backend or transport failure, including a missing credential.
    #[error(transparent)]
    Sdk(#[from] SdkError),

    /// Credential persistence failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Local validation of user input failed; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ModelError),

    /// The operation is already in flight (or blocked by one that is).
    #[error("{0} is already in progress")]
    Busy(TransformOp),

    /// The document view has not finished its authentication check.
    #[error("document view is not ready")]
    NotReady,
}

impl SessionError {
    /// User-facing failure kind, for errors that came from the backend
    /// boundary.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Sdk(e) => Some(e.kind()),
            _ => None,
        }
    }
}
