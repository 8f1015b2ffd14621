//! Content transform wire types.
//!
//! Two transforms can be applied to the document being read: a
//! personalization rewrite driven by the viewer's background profile, and a
//! translation into a target language. Translation is applied to the
//! personalized text when one exists.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::identity::UserId;

/// Language the translate action targets unless configured otherwise.
pub const DEFAULT_TARGET_LANGUAGE: &str = "ur";

// ---------------------------------------------------------------------------
// DisplayedVariant
// ---------------------------------------------------------------------------

/// Which version of the document body is selected for display.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DisplayedVariant {
    /// The document as rendered by the site.
    #[default]
    Original,
    /// The personalization rewrite.
    Personalized,
    /// The translation.
    Translated,
}

// ---------------------------------------------------------------------------
// TargetLanguage
// ---------------------------------------------------------------------------

/// Language code sent as `target_language` (e.g. `"ur"`).
///
/// # Examples
///
/// ```
/// use scholia_models::TargetLanguage;
///
/// assert_eq!(TargetLanguage::default().as_str(), "ur");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TargetLanguage(String);

impl TargetLanguage {
    /// Create a target language from a language code.
    pub fn new(code: &str) -> Self {
        Self(code.to_string())
    }

    /// Return the language code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TargetLanguage {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_LANGUAGE)
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TargetLanguage {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Personalize
// ---------------------------------------------------------------------------

/// Body of `POST /personalize`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PersonalizeRequest {
    /// Document being personalized; lets the backend cache per chapter.
    pub chapter_path: DocumentId,
    /// Raw document text to rewrite.
    pub chapter_original_text: String,
    /// Viewer the rewrite is tailored to.
    pub user_id: UserId,
}

/// Success body of `POST /personalize`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PersonalizeResponse {
    /// The rewritten document text.
    pub personalized_chapter_text: String,
}

// ---------------------------------------------------------------------------
// Translate
// ---------------------------------------------------------------------------

/// Body of `POST /translate`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    /// Text to translate.
    pub text: String,
    /// Language to translate into.
    pub target_language: TargetLanguage,
}

/// Success body of `POST /translate`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TranslateResponse {
    /// The translated text.
    pub translated_text: String,
}
