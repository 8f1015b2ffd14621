//! Captured text selections.
//!
//! A [`SelectionContext`] is either empty or holds both the selected text
//! and the id of the document it was taken from. The two halves can never
//! be observed apart because they live in a single [`CapturedSelection`].

use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// Distance, in pixels, between the selection's bottom-right corner and the
/// floating "Ask AI" affordance.
pub const AFFORDANCE_OFFSET: f64 = 5.0;

// ---------------------------------------------------------------------------
// SelectionContext
// ---------------------------------------------------------------------------

/// A non-empty selection together with its owning document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CapturedSelection {
    /// Trimmed selected text, never empty.
    pub text: String,
    /// Document the text was selected in.
    pub document_id: DocumentId,
}

/// Selection context handed from the reader to the next chat send.
///
/// # Examples
///
/// ```
/// use scholia_models::{DocumentId, SelectionContext};
///
/// let ctx = SelectionContext::capture("  torque control ", DocumentId::new("ch-2"));
/// assert_eq!(ctx.text(), Some("torque control"));
/// assert_eq!(ctx.document_id().map(DocumentId::as_str), Some("ch-2"));
///
/// assert!(SelectionContext::capture("   ", DocumentId::new("ch-2")).is_empty());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionContext(Option<CapturedSelection>);

impl SelectionContext {
    /// The empty context.
    pub fn empty() -> Self {
        Self(None)
    }

    /// Capture `text` (trimmed) from `document_id`.
    ///
    /// Whitespace-only text yields the empty context.
    pub fn capture(text: &str, document_id: DocumentId) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self(None);
        }
        Self(Some(CapturedSelection {
            text: text.to_string(),
            document_id,
        }))
    }

    /// `true` when nothing is captured.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The captured text, if any.
    pub fn text(&self) -> Option<&str> {
        self.0.as_ref().map(|s| s.text.as_str())
    }

    /// The owning document, if any.
    pub fn document_id(&self) -> Option<&DocumentId> {
        self.0.as_ref().map(|s| &s.document_id)
    }

    /// Borrow the captured pair.
    pub fn captured(&self) -> Option<&CapturedSelection> {
        self.0.as_ref()
    }

    /// Consume into the captured pair.
    pub fn into_captured(self) -> Option<CapturedSelection> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Bounding rectangle of a selection range, in viewport pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl SelectionRect {
    /// Point at which the "Ask AI" affordance is placed: just past the
    /// bottom-right corner of the selection.
    pub fn anchor(&self) -> AnchorPoint {
        AnchorPoint {
            x: self.right + AFFORDANCE_OFFSET,
            y: self.bottom + AFFORDANCE_OFFSET,
        }
    }
}

/// Screen position of the floating affordance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AnchorPoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}
