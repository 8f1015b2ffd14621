//! Document identifiers.
//!
//! Every document shown by the reader is addressed by a [`DocumentId`]
//! (the chapter path on the backend side). The id travels with captured
//! selections as `chapter_id` and with personalize requests as
//! `chapter_path`.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// Identifier of a document (chapter) in the reader.
///
/// # Examples
///
/// ```
/// use scholia_models::DocumentId;
///
/// let id = DocumentId::new("module-1/ros2-nodes");
/// assert_eq!(id.to_string(), "module-1/ros2-nodes");
///
/// let id2: DocumentId = "module-1/ros2-nodes".into();
/// assert_eq!(id, id2);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new `DocumentId` from a string slice.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for DocumentId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}
