//! Viewer identity.
//!
//! The identity record is returned by the authentication endpoint next to
//! the access token and persisted verbatim alongside it. The core only
//! reads [`Identity::id`] (sent as `user_id` to the personalize endpoint);
//! every other field the backend includes is preserved in
//! [`Identity::extra`] so a stored record round-trips unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric user identifier assigned by the backend.
///
/// # Examples
///
/// ```
/// use scholia_models::UserId;
///
/// let id = UserId::new(42);
/// assert_eq!(id.to_string(), "42");
/// assert_eq!(id.get(), 42);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity record of the authenticated viewer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Identity {
    /// Backend user id.
    pub id: UserId,
    /// Login e-mail address.
    pub email: String,
    /// Display name, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Any additional fields of the backend record.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Build an identity with no extra fields.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name to greet the viewer with: the display name, else the e-mail.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}
