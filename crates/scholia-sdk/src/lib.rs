//! # Scholia SDK
//!
//! HTTP client for the **Scholia** learning-assistant backend.
//!
//! The SDK provides:
//!
//! * [`ScholiaClient`]: typed calls for sign-in, profile, background quiz,
//!   streaming chat, personalization and translation.
//! * [`ApiRoutes`]: canonical endpoint URLs shared by the client and the
//!   mock backend.
//! * [`TextStream`]: the chat reply as an ordered sequence of decoded text
//!   segments.
//! * [`SdkError`]: unified error type for all SDK operations.
//! * [`BearerCredentials`]: token + identity pair obtained at sign-in.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use scholia_models::{ChatRequest, SelectionContext};
//! use scholia_sdk::ScholiaClient;
//!
//! # async fn run() -> Result<(), scholia_sdk::SdkError> {
//! let client = ScholiaClient::new("http://127.0.0.1:8000")?;
//! let session = client.sign_in("a1@example.com", "secret").await?;
//!
//! let request = ChatRequest::new("What is a ROS 2 node?", &SelectionContext::empty());
//! let mut reply = client.open_chat(&session.access_token, &request).await?;
//! while let Some(chunk) = reply.next_chunk().await? {
//!     print!("{chunk}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod routes;
pub mod stream;

pub use client::ScholiaClient;
pub use credentials::BearerCredentials;
pub use error::{ErrorKind, SdkError};
pub use routes::ApiRoutes;
pub use stream::{TextStream, Utf8ChunkDecoder};
