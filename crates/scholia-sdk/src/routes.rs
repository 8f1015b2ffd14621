//! Canonical backend routes.
//!
//! All URLs the client calls **must** be built through [`ApiRoutes`] so the
//! SDK and the mock backend agree on a single path layout.
//!
//! # Route layout
//!
//! ```text
//! POST {base}/auth/login       ← email + password → token + identity
//! POST {base}/auth/register    ← email + password
//! GET  {base}/profile          ← bearer → user record
//! POST {base}/profile/quiz     ← bearer → quiz receipt
//! POST {base}/chat             ← bearer → chunked text stream
//! POST {base}/personalize      ← bearer → personalized text
//! POST {base}/translate        ← bearer → translated text
//! ```

/// Path of the sign-in endpoint.
pub const LOGIN_PATH: &str = "/auth/login";
/// Path of the registration endpoint.
pub const REGISTER_PATH: &str = "/auth/register";
/// Path of the profile endpoint.
pub const PROFILE_PATH: &str = "/profile";
/// Path of the background quiz endpoint.
pub const QUIZ_PATH: &str = "/profile/quiz";
/// Path of the streaming chat endpoint.
pub const CHAT_PATH: &str = "/chat";
/// Path of the personalization endpoint.
pub const PERSONALIZE_PATH: &str = "/personalize";
/// Path of the translation endpoint.
pub const TRANSLATE_PATH: &str = "/translate";

/// Central authority for backend URLs.
///
/// # Examples
///
/// ```
/// use scholia_sdk::ApiRoutes;
///
/// let routes = ApiRoutes::new("http://127.0.0.1:8000/");
/// assert_eq!(routes.chat(), "http://127.0.0.1:8000/chat");
/// assert_eq!(routes.quiz(), "http://127.0.0.1:8000/profile/quiz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    base: String,
}

impl ApiRoutes {
    /// Create a route table rooted at `base_url`; trailing slashes are
    /// ignored.
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn join(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// `POST /auth/login`
    pub fn login(&self) -> String {
        self.join(LOGIN_PATH)
    }

    /// `POST /auth/register`
    pub fn register(&self) -> String {
        self.join(REGISTER_PATH)
    }

    /// `GET /profile`
    pub fn profile(&self) -> String {
        self.join(PROFILE_PATH)
    }

    /// `POST /profile/quiz`
    pub fn quiz(&self) -> String {
        self.join(QUIZ_PATH)
    }

    /// `POST /chat`
    pub fn chat(&self) -> String {
        self.join(CHAT_PATH)
    }

    /// `POST /personalize`
    pub fn personalize(&self) -> String {
        self.join(PERSONALIZE_PATH)
    }

    /// `POST /translate`
    pub fn translate(&self) -> String {
        self.join(TRANSLATE_PATH)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
