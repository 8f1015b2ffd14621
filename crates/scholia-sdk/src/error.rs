//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. [`SdkError::kind`] folds it onto the four
//! user-facing failure kinds ([`ErrorKind`]) the reader distinguishes.

use scholia_models::ErrorDetail;

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// A gated call was attempted without a bearer credential. No request
    /// was sent.
    #[error("authentication required")]
    AuthRequired,

    /// The backend answered with a non-2xx status.
    #[error("{detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Resolved error body.
        detail: ErrorDetail,
    },

    /// HTTP request failure (connection refused, DNS, TLS, …).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body ended abnormally after the stream had started.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or missing configuration (e.g. bad URL).
    #[error("configuration error: {0}")]
    Config(String),
}

/// User-facing failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No credential for a gated action.
    AuthRequired,
    /// The backend rejected the request with a detail message.
    Validation,
    /// Network unreachable or response not understood.
    Transport,
    /// The connection dropped mid-stream.
    StreamInterrupted,
}

impl SdkError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthRequired => ErrorKind::AuthRequired,
            Self::Rejected { .. } => ErrorKind::Validation,
            Self::StreamInterrupted(_) => ErrorKind::StreamInterrupted,
            Self::Http(_) | Self::Serialization(_) | Self::Config(_) => ErrorKind::Transport,
        }
    }

    /// The backend's detail, for [`SdkError::Rejected`].
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Rejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}
