//! # Scholia session
//!
//! Session and state coordination for the Scholia reading assistant: the
//! layer between a documentation reader's UI and the backend.
//!
//! ```text
//! pointer release ─► SelectionTracker ─► SelectionStore ─┐
//!                                                        ▼
//! "Ask AI" ─► DocumentViewCoordinator ─► AssistantVisibility     ChatSession ─► POST /chat (stream)
//!                 │                                                  ▲
//!                 ├─► TransformEngine ─► POST /personalize, /translate
//!                 └─► CredentialStore ◄── AccountFlows ─► POST /auth/login
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`credential_store`] | Bearer credential state, login / logout |
//! | [`persistence`] | Durable credential storage (file, memory) |
//! | [`selection`] | Selection context, tracker, viewport registration |
//! | [`visibility`] | Assistant panel open/closed flag |
//! | [`chat`] | Chat engine: transcript and streamed replies |
//! | [`transform`] | Personalize / translate lifecycle and display rule |
//! | [`document_view`] | Per-document coordinator and auth gate |
//! | [`account`] | Sign-in, sign-up, background quiz |
//! | [`session`] | [`LearningSession`], wiring of all of the above |
//! | [`config`] | Environment configuration |
//! | [`error`] | [`SessionError`], [`StorageError`] |
//!
//! All shared state is held in [`tokio::sync::watch`] channels: each
//! record has one sender, mutations are serialized, and subscribers see a
//! change before the mutating call returns.

pub mod account;
pub mod chat;
pub mod config;
pub mod credential_store;
pub mod document_view;
pub mod error;
pub mod persistence;
pub mod selection;
pub mod session;
pub mod transform;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use account::{AccountFlows, QuizInput};
pub use chat::{ChatPhase, ChatSession, ChatState, SendOutcome};
pub use config::SessionConfig;
pub use credential_store::{Credential, CredentialStore};
pub use document_view::{
    DocumentView, DocumentViewCoordinator, Navigator, PrimaryAction, Redirect, RedirectReason,
    ViewPhase,
};
pub use error::{SessionError, StorageError};
pub use persistence::{CredentialStorage, FileCredentialStorage, MemoryCredentialStorage};
pub use selection::{Affordance, PointerRelease, SelectionStore, SelectionTracker, ViewportId};
pub use session::LearningSession;
pub use transform::{DisplayContent, OperationStatus, TransformEngine, TransformOp, TransformState};
pub use visibility::AssistantVisibility;
