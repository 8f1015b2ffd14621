//! Error types for the mock backend.
//!
//! [`BackendError`] implements [`axum::response::IntoResponse`] so handlers
//! can return `Result<…, BackendError>` directly. Bodies follow the
//! `{"detail": …}` convention the client expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors a mock handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Missing or unknown bearer token.
    #[error("Not authenticated")]
    Unauthorized,

    /// E-mail / password pair did not match an account.
    #[error("Incorrect email or password")]
    BadCredentials,

    /// Registration for an e-mail that already has an account.
    #[error("Email already registered")]
    DuplicateAccount,

    /// Personalization requested before the background quiz was taken.
    #[error("User profile not found.")]
    ProfileNotFound,

    /// A request field failed validation; rendered as a field error list.
    #[error("{0}")]
    Invalid(String),

    /// A scripted failure: raw status and body.
    #[error("scripted failure ({status})")]
    Scripted {
        /// Status code to answer with.
        status: u16,
        /// Body to answer with, sent verbatim.
        body: String,
    },
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Unauthorized | Self::BadCredentials => {
                (StatusCode::UNAUTHORIZED, json!({ "detail": self.to_string() }))
            }
            Self::DuplicateAccount => (StatusCode::BAD_REQUEST, json!({ "detail": self.to_string() })),
            Self::ProfileNotFound => (StatusCode::NOT_FOUND, json!({ "detail": self.to_string() })),
            Self::Invalid(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "detail": [{ "loc": ["body"], "msg": msg, "type": "value_error" }] }),
            ),
            Self::Scripted { status, body } => {
                let status =
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                tracing::warn!(%status, "scripted failure");
                return (status, body.clone()).into_response();
            }
        };

        tracing::warn!(%status, error = %self, "request rejected");
        (status, Json(body)).into_response()
    }
}
