//! Shared, scriptable state of the mock backend.
//!
//! A [`MockBackend`] is cheap to clone; every clone sees the same accounts,
//! sessions, scripted replies and recorded requests. Tests keep one clone
//! to script behaviour and inspect what the client sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use scholia_models::{
    ChatRequest, Identity, PersonalizeRequest, QuizAnswers, TranslateRequest, UserId,
};
use tokio::sync::Notify;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

/// How `POST /chat` answers.
#[derive(Debug, Clone, Default)]
pub enum ChatScript {
    /// Stream a canned reply built from the request, one word per chunk.
    #[default]
    Echo,
    /// Stream exactly these chunks.
    Chunks(Vec<String>),
    /// Answer with a non-2xx status and a raw body.
    Reject {
        /// Status code.
        status: u16,
        /// Raw body.
        body: String,
    },
    /// Stream these chunks, then abort the connection mid-body.
    Interrupt(Vec<String>),
    /// Stream the first chunk, wait for `gate` to be notified, then stream
    /// the rest.
    Gated {
        /// Chunks to stream.
        chunks: Vec<String>,
        /// Released by the test.
        gate: Arc<Notify>,
    },
}

/// How `POST /personalize` or `POST /translate` answers.
#[derive(Debug, Clone, Default)]
pub enum TransformReply {
    /// Built-in deterministic transform of the input.
    #[default]
    Derived,
    /// Always answer with this text.
    Text(String),
    /// Answer with a non-2xx status and a raw body.
    Reject {
        /// Status code.
        status: u16,
        /// Raw body.
        body: String,
    },
    /// Wait for `gate`, then answer with this text.
    Gated {
        /// Reply text.
        text: String,
        /// Released by the test.
        gate: Arc<Notify>,
    },
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Account {
    password: String,
    identity: Identity,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    profiles: HashMap<UserId, serde_json::Value>,
    next_user_id: i64,
    chat: ChatScript,
    personalize: TransformReply,
    translate: TransformReply,
    chat_requests: Vec<ChatRequest>,
    personalize_requests: Vec<PersonalizeRequest>,
    translate_requests: Vec<TranslateRequest>,
}

/// The mock backend's state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockBackend {
    /// An empty backend with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not wedge the other handlers.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // -- accounts -----------------------------------------------------------

    /// Register an account. Returns `None` when the e-mail is taken.
    pub fn register(&self, email: &str, password: &str, name: Option<&str>) -> Option<Identity> {
        let mut inner = self.lock();
        if inner.accounts.contains_key(email) {
            return None;
        }
        inner.next_user_id += 1;
        let mut identity = Identity::new(UserId::new(inner.next_user_id), email);
        if let Some(name) = name {
            identity = identity.with_name(name);
        }
        inner.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        Some(identity)
    }

    /// Check a password and open a session. Returns the new token.
    pub fn sign_in(&self, email: &str, password: &str) -> Option<(String, Identity)> {
        let mut inner = self.lock();
        let identity = inner
            .accounts
            .get(email)
            .filter(|a| a.password == password)
            .map(|a| a.identity.clone())?;
        let token = format!("tok-{}", Uuid::new_v4());
        inner.sessions.insert(token.clone(), email.to_string());
        Some((token, identity))
    }

    /// Register (if needed) and sign in, for test setup.
    pub fn session_for(&self, email: &str, name: Option<&str>) -> (String, Identity) {
        const PASSWORD: &str = "password";
        self.register(email, PASSWORD, name);
        let mut inner = self.lock();
        let identity = inner
            .accounts
            .get(email)
            .map(|a| a.identity.clone())
            .unwrap_or_else(|| Identity::new(UserId::new(0), email));
        let token = format!("tok-{}", Uuid::new_v4());
        inner.sessions.insert(token.clone(), email.to_string());
        (token, identity)
    }

    /// Resolve a bearer token.
    pub fn identity_for_token(&self, token: &str) -> Option<Identity> {
        let inner = self.lock();
        let email = inner.sessions.get(token)?;
        inner.accounts.get(email).map(|a| a.identity.clone())
    }

    // -- profiles -----------------------------------------------------------

    /// Store a background profile for `user`.
    pub fn set_profile(&self, user: UserId, profile: serde_json::Value) {
        self.lock().profiles.insert(user, profile);
    }

    /// Store quiz answers as the background profile. Returns the profile id.
    pub fn store_quiz(&self, answers: &QuizAnswers) -> i64 {
        let profile = serde_json::to_value(answers).unwrap_or(serde_json::Value::Null);
        let mut inner = self.lock();
        inner.profiles.insert(answers.user_id, profile);
        i64::try_from(inner.profiles.len()).unwrap_or(i64::MAX)
    }

    /// The stored profile of `user`, `Null` when none.
    pub fn profile(&self, user: UserId) -> serde_json::Value {
        self.lock()
            .profiles
            .get(&user)
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }

    // -- scripts ------------------------------------------------------------

    /// Script `POST /chat`.
    pub fn script_chat(&self, script: ChatScript) {
        self.lock().chat = script;
    }

    /// Script `POST /personalize`.
    pub fn script_personalize(&self, reply: TransformReply) {
        self.lock().personalize = reply;
    }

    /// Script `POST /translate`.
    pub fn script_translate(&self, reply: TransformReply) {
        self.lock().translate = reply;
    }

    pub(crate) fn chat_script(&self) -> ChatScript {
        self.lock().chat.clone()
    }

    pub(crate) fn personalize_reply(&self) -> TransformReply {
        self.lock().personalize.clone()
    }

    pub(crate) fn translate_reply(&self) -> TransformReply {
        self.lock().translate.clone()
    }

    // -- recorded requests --------------------------------------------------

    pub(crate) fn record_chat(&self, req: ChatRequest) {
        self.lock().chat_requests.push(req);
    }

    pub(crate) fn record_personalize(&self, req: PersonalizeRequest) {
        self.lock().personalize_requests.push(req);
    }

    pub(crate) fn record_translate(&self, req: TranslateRequest) {
        self.lock().translate_requests.push(req);
    }

    /// Every authenticated chat request received so far.
    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.lock().chat_requests.clone()
    }

    /// Every authenticated personalize request received so far.
    pub fn personalize_requests(&self) -> Vec<PersonalizeRequest> {
        self.lock().personalize_requests.clone()
    }

    /// Every authenticated translate request received so far.
    pub fn translate_requests(&self) -> Vec<TranslateRequest> {
        self.lock().translate_requests.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_refused() {
        let backend = MockBackend::new();
        assert!(backend.register("a@b.c", "pw", None).is_some());
        assert!(backend.register("a@b.c", "other", None).is_none());
    }

    #[test]
    fn sign_in_checks_password_and_issues_distinct_tokens() {
        let backend = MockBackend::new();
        let identity = backend.register("a@b.c", "pw", Some("A1")).unwrap();
        assert!(backend.sign_in("a@b.c", "nope").is_none());

        let (t1, who) = backend.sign_in("a@b.c", "pw").unwrap();
        let (t2, _) = backend.sign_in("a@b.c", "pw").unwrap();
        assert_ne!(t1, t2);
        assert_eq!(who, identity);
        assert_eq!(backend.identity_for_token(&t1), Some(identity));
        assert_eq!(backend.identity_for_token("forged"), None);
    }

    #[test]
    fn user_ids_are_sequential() {
        let backend = MockBackend::new();
        let a = backend.register("a@b.c", "pw", None).unwrap();
        let b = backend.register("b@b.c", "pw", None).unwrap();
        assert_eq!(a.id, UserId::new(1));
        assert_eq!(b.id, UserId::new(2));
    }

    #[test]
    fn missing_profile_is_null() {
        let backend = MockBackend::new();
        assert!(backend.profile(UserId::new(5)).is_null());
        backend.set_profile(UserId::new(5), serde_json::json!({ "ros_experience": 2 }));
        assert_eq!(backend.profile(UserId::new(5))["ros_experience"], 2);
    }
}
