//! Chat transcript types and the chat request body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::selection::SelectionContext;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Author of a transcript message.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sender {
    /// The reader.
    User,
    /// The remote assistant.
    Assistant,
}

/// One entry of the transcript.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    /// Who wrote the message.
    pub sender: Sender,
    /// Message body. Grows while the assistant reply is streaming.
    pub text: String,
    /// When the message was appended to the transcript.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// A message written by the reader.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    /// A message written by the assistant.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Chronological chat history of the active session.
///
/// Messages are only ever appended; the one exception is the tail message,
/// whose text may be extended by [`Transcript::extend_tail`] or replaced by
/// [`Transcript::replace_tail`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// An empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index.
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Append `chunk` verbatim to the last message.
    ///
    /// Returns `false` when the transcript is empty.
    pub fn extend_tail(&mut self, chunk: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) => {
                last.text.push_str(chunk);
                true
            }
            None => false,
        }
    }

    /// Replace the last message.
    ///
    /// Returns `false` when the transcript is empty.
    pub fn replace_tail(&mut self, message: Message) -> bool {
        match self.messages.last_mut() {
            Some(last) => {
                *last = message;
                true
            }
            None => false,
        }
    }

    /// The last message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Message at `index`.
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// `true` when no message has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate in chronological order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// All messages in chronological order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

// ---------------------------------------------------------------------------
// ChatRequest
// ---------------------------------------------------------------------------

/// Body of `POST /chat`.
///
/// `selected_text` and `chapter_id` are either both present or both
/// omitted from the JSON.
///
/// # Examples
///
/// ```
/// use scholia_models::{ChatRequest, DocumentId, SelectionContext};
///
/// let ctx = SelectionContext::capture("torque control", DocumentId::new("ch-2"));
/// let body = serde_json::to_value(ChatRequest::new("explain this", &ctx)).unwrap();
/// assert_eq!(
///     body,
///     serde_json::json!({
///         "message": "explain this",
///         "selected_text": "torque control",
///         "chapter_id": "ch-2",
///     }),
/// );
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// The reader's question.
    pub message: String,
    /// Text the reader selected before asking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    /// Document the selection belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<DocumentId>,
}

impl ChatRequest {
    /// Build a request body from the input and whatever context is held.
    pub fn new(message: impl Into<String>, context: &SelectionContext) -> Self {
        let (selected_text, chapter_id) = match context.captured() {
            Some(captured) => (
                Some(captured.text.clone()),
                Some(captured.document_id.clone()),
            ),
            None => (None, None),
        };
        Self {
            message: message.into(),
            selected_text,
            chapter_id,
        }
    }
}
