#![deny(missing_docs)]

//! # Scholia Models
//!
//! Core data types for the Scholia contextual learning assistant.
//!
//! ## Data flow
//!
//! ```text
//! pointer release ──► SelectionContext { text, document_id }
//!                          │ (consumed once)
//!                          ▼
//!                     ChatRequest ──► chunked text stream ──► Transcript
//!
//! document text ──► PersonalizeRequest ──► personalized text
//!                          │ (source of)
//!                          ▼
//!                   TranslateRequest ──► translated text
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`document`] | Document identifiers |
//! | [`identity`] | Viewer identity record and user id |
//! | [`selection`] | Captured selection context and anchor geometry |
//! | [`chat`] | Transcript, messages and the chat request body |
//! | [`transform`] | Personalize / translate wire types and displayed variants |
//! | [`account`] | Login, registration, profile and background quiz types |
//! | [`error`] | Validation errors and backend error details |

pub mod account;
pub mod chat;
pub mod document;
pub mod error;
pub mod identity;
pub mod selection;
pub mod transform;

// Re-export all public types at crate root for convenience.
// Downstream crates can use `scholia_models::DocumentId` directly.
pub use account::*;
pub use chat::*;
pub use document::*;
pub use error::*;
pub use identity::*;
pub use selection::*;
pub use transform::*;
