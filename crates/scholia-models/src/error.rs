//! Error types for the `scholia-models` crate.
//!
//! [`ModelError`] is returned by local validation. [`ErrorDetail`] is the
//! resolved form of an error body sent by the backend: the body is
//! inspected once, at the HTTP boundary, and downstream code only ever
//! matches on the tagged variants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A self-assessed experience level was out of range.
    #[error("invalid {field} {value}: {reason}")]
    InvalidExperience {
        /// Name of the offending field.
        field: String,
        /// The value that failed validation.
        value: u8,
        /// Human-readable explanation.
        reason: String,
    },

    /// A required field was empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}

// ---------------------------------------------------------------------------
// ErrorDetail
// ---------------------------------------------------------------------------

/// Fallback text when neither the body nor the status line says anything.
const GENERIC_FAILURE: &str = "Request failed";

/// Error detail returned by the backend with a non-2xx status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ErrorDetail {
    /// `{"detail": "<text>"}`
    Message(String),
    /// `{"detail": <object or list>}`, e.g. a list of field validation errors.
    Structured(serde_json::Value),
    /// The body was not a recognised error document; carries the status text.
    Status(String),
}

impl ErrorDetail {
    /// Resolve an error body.
    ///
    /// `status_text` is used when the body is not JSON or has no
    /// `detail`/`error` member.
    ///
    /// # Examples
    ///
    /// ```
    /// use scholia_models::ErrorDetail;
    ///
    /// let d = ErrorDetail::from_body(r#"{"detail":"User profile not found."}"#, "Not Found");
    /// assert_eq!(d, ErrorDetail::Message("User profile not found.".into()));
    ///
    /// let d = ErrorDetail::from_body("<html>oops</html>", "Bad Gateway");
    /// assert_eq!(d.to_string(), "Bad Gateway");
    /// ```
    pub fn from_body(body: &str, status_text: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let detail = parsed
            .as_ref()
            .and_then(|v| v.get("detail").or_else(|| v.get("error")));

        match detail {
            Some(serde_json::Value::String(text)) if !text.is_empty() => {
                Self::Message(text.clone())
            }
            Some(value) if !value.is_null() && !value.is_string() => {
                Self::Structured(value.clone())
            }
            _ if status_text.is_empty() => Self::Status(GENERIC_FAILURE.to_string()),
            _ => Self::Status(status_text.to_string()),
        }
    }

    /// Human-readable rendering, identical to the `Display` output.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(text) | Self::Status(text) => f.write_str(text),
            Self::Structured(value) => f.write_str(&summarize(value)),
        }
    }
}

/// Collapse a structured detail into one line: the `msg` members of a
/// validation error list joined with `"; "`, else compact JSON.
fn summarize(value: &serde_json::Value) -> String {
    let msg_of = |v: &serde_json::Value| v.get("msg").and_then(|m| m.as_str()).map(String::from);

    match value {
        serde_json::Value::Array(items) => {
            let msgs: Vec<String> = items.iter().filter_map(msg_of).collect();
            if msgs.is_empty() {
                value.to_string()
            } else {
                msgs.join("; ")
            }
        }
        other => msg_of(other).unwrap_or_else(|| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_experience() {
        let err = ModelError::InvalidExperience {
            field: "python_experience".into(),
            value: 9,
            reason: "must be between 0 and 5".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid python_experience 9: must be between 0 and 5"
        );
    }

    #[test]
    fn error_display_missing_field() {
        let err = ModelError::MissingField {
            field: "email".into(),
        };
        assert_eq!(err.to_string(), "missing required field: email");
    }

    #[test]
    fn validation_list_is_summarized() {
        let body = r#"{"detail":[{"loc":["body","message"],"msg":"field required"},{"msg":"too short"}]}"#;
        let detail = ErrorDetail::from_body(body, "Unprocessable Entity");
        assert!(matches!(detail, ErrorDetail::Structured(_)));
        assert_eq!(detail.to_string(), "field required; too short");
    }

    #[test]
    fn error_member_is_accepted() {
        let detail = ErrorDetail::from_body(r#"{"error":"unknown user"}"#, "Unauthorized");
        assert_eq!(detail, ErrorDetail::Message("unknown user".into()));
    }

    #[test]
    fn empty_body_falls_back_to_status_text() {
        assert_eq!(
            ErrorDetail::from_body("", "Service Unavailable"),
            ErrorDetail::Status("Service Unavailable".into())
        );
        assert_eq!(ErrorDetail::from_body("", "").to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn null_detail_falls_back_to_status_text() {
        assert_eq!(
            ErrorDetail::from_body(r#"{"detail":null}"#, "Bad Request"),
            ErrorDetail::Status("Bad Request".into())
        );
    }
}
