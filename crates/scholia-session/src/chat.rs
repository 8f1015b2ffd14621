//! The chat session engine.
//!
//! One [`ChatSession`] owns the transcript of the active session and drives
//! the request/stream protocol:
//!
//! ```text
//!  Idle ──send(input)──► Sending ──stream ends──► Idle
//!                          │
//!                          └──any failure──► error message ──► Idle
//! ```
//!
//! While `Sending`, the tail of the transcript is the live assistant
//! message; every received chunk is appended to it verbatim and published
//! to subscribers immediately.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use scholia_models::{ChatRequest, Message, Sender, Transcript};
use scholia_sdk::{ErrorKind, ScholiaClient, SdkError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::credential_store::CredentialStore;
use crate::selection::SelectionStore;

/// Shown when the backend is unreachable or the stream drops.
pub const CHAT_TRANSPORT_ERROR: &str = "Error communicating with the chatbot.";

/// Shown when a message is sent without being signed in.
pub const CHAT_AUTH_REQUIRED: &str = "Please log in to chat with the assistant.";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Phase of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatPhase {
    /// Ready to send.
    #[default]
    Idle,
    /// A reply is being received; further sends are ignored.
    Sending,
}

/// Observable state of a chat session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Current phase.
    pub phase: ChatPhase,
    /// Chronological history.
    pub transcript: Transcript,
}

impl ChatState {
    /// `true` while a reply is being received.
    pub fn is_streaming(&self) -> bool {
        self.phase == ChatPhase::Sending
    }

    /// The message currently being appended to, if any.
    pub fn live_message(&self) -> Option<&Message> {
        self.is_streaming()
            .then(|| self.transcript.last())
            .flatten()
    }
}

/// Result of a [`ChatSession::send`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input or a send already in progress; nothing happened.
    Ignored,
    /// The full reply was received.
    Completed,
}

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// The chat engine. Clones share one transcript.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: ScholiaClient,
    credentials: CredentialStore,
    selection: SelectionStore,
    state: Arc<watch::Sender<ChatState>>,
}

impl ChatSession {
    /// An idle session with an empty transcript.
    pub fn new(client: ScholiaClient, credentials: CredentialStore, selection: SelectionStore) -> Self {
        let (tx, _) = watch::channel(ChatState::default());
        Self {
            client,
            credentials,
            selection,
            state: Arc::new(tx),
        }
    }

    /// Send `input` with whatever selection context is pending.
    ///
    /// Blank input, or a call while a reply is streaming, is a no-op. The
    /// selection context is consumed by every send that gets past that
    /// check, whatever the outcome. Failures are written into the
    /// transcript and also returned.
    pub async fn send(&self, input: &str) -> Result<SendOutcome, SdkError> {
        if input.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let started = self.state.send_if_modified(|state| {
            if state.is_streaming() {
                return false;
            }
            state.phase = ChatPhase::Sending;
            state.transcript.push(Message::user(input));
            state.transcript.push(Message::assistant(""));
            true
        });
        if !started {
            debug!("send ignored: reply still streaming");
            return Ok(SendOutcome::Ignored);
        }
        let inflight = InFlight::new(&self.state);

        let context = self.selection.take();
        let request = ChatRequest::new(input, &context);
        debug!(with_selection = !context.is_empty(), "sending chat message");

        let result = self.exchange(&request).await;
        match &result {
            Ok(()) => info!("chat reply complete"),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "chat send failed");
                self.surface(e);
            }
        }
        inflight.settle();
        result.map(|()| SendOutcome::Completed)
    }

    async fn exchange(&self, request: &ChatRequest) -> Result<(), SdkError> {
        let token = self
            .credentials
            .bearer()
            .map(|c| c.token)
            .ok_or(SdkError::AuthRequired)?;
        let reply = self.client.open_chat(&token, request).await?;
        fold_chunks(&self.state, reply.into_stream()).await
    }

    /// Write a failure into the transcript: over the placeholder while it
    /// is still empty, otherwise as a new message after the partial reply.
    fn surface(&self, error: &SdkError) {
        let text = match error.kind() {
            ErrorKind::AuthRequired => CHAT_AUTH_REQUIRED.to_string(),
            ErrorKind::Validation => error.to_string(),
            ErrorKind::Transport | ErrorKind::StreamInterrupted => CHAT_TRANSPORT_ERROR.to_string(),
        };
        self.state.send_modify(|state| {
            let placeholder_empty = state
                .transcript
                .last()
                .is_some_and(|m| m.text.is_empty());
            if placeholder_empty {
                state.transcript.replace_tail(Message::assistant(text));
            } else {
                state.transcript.push(Message::assistant(text));
            }
        });
    }

    /// Snapshot of the state.
    pub fn state(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Transcript {
        self.state.borrow().transcript.clone()
    }

    /// `true` while a reply is being received.
    pub fn is_streaming(&self) -> bool {
        self.state.borrow().is_streaming()
    }

    /// Observe every transcript update, chunk by chunk.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }
}

/// Returns the engine to `Idle` when a send ends, including when its future
/// is dropped mid-reply. An unsettled drop replaces a still-empty
/// placeholder with [`CHAT_TRANSPORT_ERROR`].
struct InFlight<'a> {
    state: &'a watch::Sender<ChatState>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a watch::Sender<ChatState>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let abandoned = !self.settled;
        self.state.send_modify(|state| {
            state.phase = ChatPhase::Idle;
            let empty_placeholder = state
                .transcript
                .last()
                .is_some_and(|m| m.sender == Sender::Assistant && m.text.is_empty());
            if abandoned && empty_placeholder {
                state
                    .transcript
                    .replace_tail(Message::assistant(CHAT_TRANSPORT_ERROR));
            }
        });
        if abandoned {
            debug!("chat send abandoned");
        }
    }
}

/// Append each chunk of `chunks` to the live message, in arrival order.
async fn fold_chunks<S>(state: &watch::Sender<ChatState>, chunks: S) -> Result<(), SdkError>
where
    S: Stream<Item = Result<String, SdkError>>,
{
    let mut chunks = std::pin::pin!(chunks);
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        state.send_modify(|s| {
            s.transcript.extend_tail(&chunk);
        });
    }
    Ok(())
}
