//! The content transform engine.
//!
//! One [`TransformEngine`] per displayed document owns the personalize and
//! translate lifecycles and decides what the body shows. Each operation
//! has its own loading flag and error slot; the results share one
//! [`TransformState`].
//!
//! Display resolution:
//!
//! ```text
//! variant == Translated && translated present  ──► translated text
//! personalized present                          ──► personalized text
//! otherwise                                     ──► original document
//! ```

use std::sync::Arc;

use scholia_models::{
    DisplayedVariant, DocumentId, ErrorDetail, PersonalizeRequest, TargetLanguage,
    TranslateRequest,
};
use scholia_sdk::{ErrorKind, ScholiaClient, SdkError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::credential_store::CredentialStore;
use crate::error::SessionError;

/// Fallback when a failed personalization carries no detail.
pub const PERSONALIZE_FAILED: &str = "Failed to personalize chapter.";
/// Fallback when a failed translation carries no detail.
pub const TRANSLATE_FAILED: &str = "Failed to translate chapter.";
/// Shown when the backend cannot be reached.
pub const NETWORK_ERROR: &str = "Network error or server unavailable.";
/// Shown when personalizing while signed out.
pub const PERSONALIZE_LOGIN_REQUIRED: &str = "Please log in to personalize content.";
/// Shown when translating while signed out.
pub const TRANSLATE_LOGIN_REQUIRED: &str = "Please log in to translate content.";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The two transform operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransformOp {
    /// Personalization rewrite.
    Personalize,
    /// Translation.
    Translate,
}

/// Loading flag and error slot of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    /// `true` while a request is in flight.
    pub loading: bool,
    /// Last failure, until dismissed or the next attempt starts.
    pub error: Option<String>,
}

/// Observable state of a document's transforms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformState {
    /// Last successful personalization.
    pub personalized: Option<String>,
    /// Last successful translation that is still current.
    pub translated: Option<String>,
    /// Variant selected for display.
    pub variant: DisplayedVariant,
    /// Personalize lifecycle.
    pub personalize: OperationStatus,
    /// Translate lifecycle.
    pub translate: OperationStatus,
    /// Bumped on every successful personalization; a translation started
    /// under an older value is stale.
    generation: u64,
}

impl TransformState {
    /// Status of `op`.
    pub fn status(&self, op: TransformOp) -> &OperationStatus {
        match op {
            TransformOp::Personalize => &self.personalize,
            TransformOp::Translate => &self.translate,
        }
    }

    fn status_mut(&mut self, op: TransformOp) -> &mut OperationStatus {
        match op {
            TransformOp::Personalize => &mut self.personalize,
            TransformOp::Translate => &mut self.translate,
        }
    }

    /// What the body shows.
    pub fn display(&self) -> DisplayContent {
        match (&self.variant, &self.translated, &self.personalized) {
            (DisplayedVariant::Translated, Some(text), _) => DisplayContent::Translated(text.clone()),
            (_, _, Some(text)) => DisplayContent::Personalized(text.clone()),
            _ => DisplayContent::Original,
        }
    }
}

/// Resolved body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayContent {
    /// The document as rendered by the site.
    Original,
    /// The personalization rewrite.
    Personalized(String),
    /// The translation.
    Translated(String),
}

impl DisplayContent {
    /// The text to show, given the original body.
    pub fn text<'a>(&'a self, original: &'a str) -> &'a str {
        match self {
            Self::Original => original,
            Self::Personalized(text) | Self::Translated(text) => text,
        }
    }
}

// ---------------------------------------------------------------------------
// TransformEngine
// ---------------------------------------------------------------------------

/// Transform engine for one document. Clones share one state.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    client: ScholiaClient,
    credentials: CredentialStore,
    document: DocumentId,
    original: Arc<str>,
    target_language: TargetLanguage,
    state: Arc<watch::Sender<TransformState>>,
}

impl TransformEngine {
    /// An engine for `document` whose body text is `original`.
    pub fn new(
        client: ScholiaClient,
        credentials: CredentialStore,
        document: DocumentId,
        original: impl Into<Arc<str>>,
        target_language: TargetLanguage,
    ) -> Self {
        let (tx, _) = watch::channel(TransformState::default());
        Self {
            client,
            credentials,
            document,
            original: original.into(),
            target_language,
            state: Arc::new(tx),
        }
    }

    /// The document this engine transforms.
    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    /// The original body text.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Claim `op`: `None` when it (or, for translate, personalize) is
    /// already loading.
    fn begin(&self, op: TransformOp) -> Option<Claim<'_>> {
        let claimed = self.state.send_if_modified(|s| {
            let blocked = s.status(op).loading
                || (op == TransformOp::Translate && s.personalize.loading);
            if blocked {
                return false;
            }
            let status = s.status_mut(op);
            status.loading = true;
            status.error = None;
            true
        });
        claimed.then(|| Claim {
            state: &*self.state,
            op,
            settled: false,
        })
    }

    /// Record a refusal that never claimed `op`; its loading flag belongs
    /// to whichever request holds it.
    fn refuse(&self, op: TransformOp, message: &str) {
        self.state
            .send_modify(|s| s.status_mut(op).error = Some(message.to_string()));
    }

    /// Rewrite the document for the signed-in reader.
    ///
    /// On success the personalized text is shown and any translation is
    /// dropped. On failure the previous result and variant are kept.
    pub async fn personalize(&self) -> Result<(), SessionError> {
        let op = TransformOp::Personalize;
        let Some(bearer) = self.credentials.bearer() else {
            self.refuse(op, PERSONALIZE_LOGIN_REQUIRED);
            return Err(SdkError::AuthRequired.into());
        };
        let claim = self.begin(op).ok_or(SessionError::Busy(op))?;

        let request = PersonalizeRequest {
            chapter_path: self.document.clone(),
            chapter_original_text: self.original.to_string(),
            user_id: bearer.identity.id,
        };
        debug!(document = %self.document, "personalizing");

        match self.client.personalize(&bearer.token, &request).await {
            Ok(text) => {
                info!(document = %self.document, "personalized");
                claim.finish(|s| {
                    s.personalized = Some(text);
                    s.translated = None;
                    s.variant = DisplayedVariant::Personalized;
                    s.generation += 1;
                });
                Ok(())
            }
            Err(e) => {
                warn!(document = %self.document, error = %e, "personalize failed");
                let message = failure_message(&e, PERSONALIZE_FAILED);
                claim.finish(|s| s.personalize.error = Some(message));
                Err(e.into())
            }
        }
    }

    /// Translate the personalized text if there is one, else the original.
    ///
    /// Refused while personalize is loading. A translation that finishes
    /// after a newer personalization landed is discarded.
    pub async fn translate(&self) -> Result<(), SessionError> {
        let op = TransformOp::Translate;
        let Some(bearer) = self.credentials.bearer() else {
            self.refuse(op, TRANSLATE_LOGIN_REQUIRED);
            return Err(SdkError::AuthRequired.into());
        };
        let claim = self.begin(op).ok_or(SessionError::Busy(op))?;

        let (source, generation) = {
            let s = self.state.borrow();
            let source = s
                .personalized
                .clone()
                .unwrap_or_else(|| self.original.to_string());
            (source, s.generation)
        };
        let request = TranslateRequest {
            text: source,
            target_language: self.target_language.clone(),
        };
        debug!(document = %self.document, language = %self.target_language, "translating");

        match self.client.translate(&bearer.token, &request).await {
            Ok(text) => {
                let mut applied = false;
                claim.finish(|s| {
                    if s.generation == generation {
                        s.translated = Some(text);
                        s.variant = DisplayedVariant::Translated;
                        applied = true;
                    }
                });
                if applied {
                    info!(document = %self.document, "translated");
                } else {
                    debug!(document = %self.document, "stale translation discarded");
                }
                Ok(())
            }
            Err(e) => {
                warn!(document = %self.document, error = %e, "translate failed");
                let message = failure_message(&e, TRANSLATE_FAILED);
                claim.finish(|s| s.translate.error = Some(message));
                Err(e.into())
            }
        }
    }

    /// Switch between the translation and the untranslated view.
    ///
    /// Showing the translation requires one to exist; returns whether the
    /// translation is now shown.
    pub fn show_translated(&self, show: bool) -> bool {
        let mut shown = false;
        self.state.send_if_modified(|s| {
            let next = match (show, &s.translated, &s.personalized) {
                (true, Some(_), _) => DisplayedVariant::Translated,
                (false, _, Some(_)) => DisplayedVariant::Personalized,
                (false, _, None) => DisplayedVariant::Original,
                (true, None, _) => s.variant,
            };
            shown = next == DisplayedVariant::Translated;
            let changed = next != s.variant;
            s.variant = next;
            changed
        });
        shown
    }

    /// Clear the error of `op`.
    pub fn dismiss_error(&self, op: TransformOp) {
        self.state.send_if_modified(|s| s.status_mut(op).error.take().is_some());
    }

    /// What the body shows.
    pub fn display(&self) -> DisplayContent {
        self.state.borrow().display()
    }

    /// The text the body shows.
    pub fn display_text(&self) -> String {
        self.display().text(&self.original).to_string()
    }

    /// Snapshot of the state.
    pub fn state(&self) -> TransformState {
        self.state.borrow().clone()
    }

    /// Observe changes.
    pub fn subscribe(&self) -> watch::Receiver<TransformState> {
        self.state.subscribe()
    }
}

/// A claimed operation. Finishing it clears the loading flag together with
/// the result; dropping it unfinished (the request future was dropped)
/// clears the flag alone.
struct Claim<'a> {
    state: &'a watch::Sender<TransformState>,
    op: TransformOp,
    settled: bool,
}

impl Claim<'_> {
    fn finish(mut self, apply: impl FnOnce(&mut TransformState)) {
        self.settled = true;
        let op = self.op;
        self.state.send_modify(|s| {
            apply(s);
            s.status_mut(op).loading = false;
        });
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let op = self.op;
        self.state.send_modify(|s| s.status_mut(op).loading = false);
        debug!(%op, "transform abandoned");
    }
}

/// User-facing text for a failed transform.
fn failure_message(error: &SdkError, fallback: &str) -> String {
    match error.kind() {
        ErrorKind::Transport | ErrorKind::StreamInterrupted => NETWORK_ERROR.to_string(),
        ErrorKind::AuthRequired | ErrorKind::Validation => match error.detail() {
            Some(ErrorDetail::Status(_)) | None => fallback.to_string(),
            Some(detail) => detail.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryCredentialStorage;
    use mock_backend::{serve_ephemeral, MockBackend, TransformReply};
    use scholia_sdk::BearerCredentials;
    use serde_json::json;
    use tokio::sync::Notify;

    const ORIGINAL: &str = "A node is a process that performs computation.";

    async fn setup(signed_in: bool) -> (MockBackend, TransformEngine) {
        let backend = MockBackend::new();
        let url = serve_ephemeral(backend.clone()).await.unwrap();
        let credentials = CredentialStore::new(Arc::new(MemoryCredentialStorage::new()));
        credentials.resolve().await;
        if signed_in {
            let (token, identity) = backend.session_for("a1@example.com", Some("A1"));
            backend.set_profile(identity.id, json!({ "ros_experience": 1 }));
            credentials.login(BearerCredentials::new(token, identity)).unwrap();
        }
        let engine = TransformEngine::new(
            ScholiaClient::new(&url).unwrap(),
            credentials,
            DocumentId::new("docs/ros2/nodes"),
            ORIGINAL,
            TargetLanguage::default(),
        );
        (backend, engine)
    }

    // ------------------------------------------------------------------
    // Display resolution
    // ------------------------------------------------------------------

    #[test]
    fn display_rule() {
        let mut s = TransformState::default();
        assert_eq!(s.display(), DisplayContent::Original);

        s.personalized = Some("P".into());
        assert_eq!(s.display(), DisplayContent::Personalized("P".into()));

        s.translated = Some("T".into());
        assert_eq!(s.display(), DisplayContent::Personalized("P".into()));

        s.variant = DisplayedVariant::Translated;
        assert_eq!(s.display(), DisplayContent::Translated("T".into()));
        assert_eq!(s.display().text(ORIGINAL), "T");
        assert_eq!(DisplayContent::Original.text(ORIGINAL), ORIGINAL);
    }

    #[test]
    fn failure_messages() {
        let rejected = |detail| SdkError::Rejected { status: 400, detail };
        assert_eq!(
            failure_message(&rejected(ErrorDetail::Message("Quota exceeded.".into())), TRANSLATE_FAILED),
            "Quota exceeded."
        );
        assert_eq!(
            failure_message(&rejected(ErrorDetail::Status("Bad Request".into())), TRANSLATE_FAILED),
            TRANSLATE_FAILED
        );
        assert_eq!(
            failure_message(&SdkError::StreamInterrupted("x".into()), PERSONALIZE_FAILED),
            NETWORK_ERROR
        );
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn personalize_then_translate_then_toggle_back() {
        let (backend, engine) = setup(true).await;
        backend.script_personalize(TransformReply::Text("Hi A1".into()));
        backend.script_translate(TransformReply::Text("اے وہاں".into()));

        engine.personalize().await.unwrap();
        assert_eq!(engine.display_text(), "Hi A1");

        engine.translate().await.unwrap();
        assert_eq!(engine.display_text(), "اے وہاں");
        assert_eq!(backend.translate_requests()[0].text, "Hi A1");

        assert!(!engine.show_translated(false));
        assert_eq!(engine.display_text(), "Hi A1");
        assert!(engine.show_translated(true));
        assert_eq!(engine.display_text(), "اے وہاں");
    }

    #[tokio::test]
    async fn translate_without_personalization_uses_original() {
        let (backend, engine) = setup(true).await;
        engine.translate().await.unwrap();

        let sent = &backend.translate_requests()[0];
        assert_eq!(sent.text, ORIGINAL);
        assert_eq!(sent.target_language.as_str(), "ur");
        assert_eq!(engine.display(), DisplayContent::Translated(format!("[ur] {ORIGINAL}")));

        assert!(!engine.show_translated(false));
        assert_eq!(engine.display(), DisplayContent::Original);
    }

    #[tokio::test]
    async fn personalize_request_names_chapter_and_reader() {
        let (backend, engine) = setup(true).await;
        engine.personalize().await.unwrap();

        let sent = &backend.personalize_requests()[0];
        assert_eq!(sent.chapter_path.as_str(), "docs/ros2/nodes");
        assert_eq!(sent.chapter_original_text, ORIGINAL);
        assert_eq!(engine.display_text(), format!("Hi A1. {ORIGINAL}"));
    }

    #[tokio::test]
    async fn failed_personalize_keeps_translation_on_screen() {
        let (backend, engine) = setup(true).await;
        backend.script_personalize(TransformReply::Text("P".into()));
        backend.script_translate(TransformReply::Text("T".into()));
        engine.personalize().await.unwrap();
        engine.translate().await.unwrap();

        backend.script_personalize(TransformReply::Reject {
            status: 500,
            body: "{}".into(),
        });
        assert!(engine.personalize().await.is_err());

        let state = engine.state();
        assert_eq!(state.variant, DisplayedVariant::Translated);
        assert_eq!(state.translated.as_deref(), Some("T"));
        assert_eq!(state.personalize.error.as_deref(), Some(PERSONALIZE_FAILED));
        assert!(!state.personalize.loading);
        assert_eq!(engine.display_text(), "T");
    }

    #[tokio::test]
    async fn personalize_success_drops_previous_translation() {
        let (backend, engine) = setup(true).await;
        backend.script_translate(TransformReply::Text("T".into()));
        engine.translate().await.unwrap();

        backend.script_personalize(TransformReply::Text("P".into()));
        engine.personalize().await.unwrap();

        let state = engine.state();
        assert_eq!(state.translated, None);
        assert_eq!(state.variant, DisplayedVariant::Personalized);
        assert_eq!(engine.display_text(), "P");
    }

    #[tokio::test]
    async fn missing_profile_surfaces_backend_detail() {
        let (backend, engine) = setup(false).await;
        let (token, identity) = backend.session_for("b2@example.com", None);
        engine
            .credentials
            .login(BearerCredentials::new(token, identity))
            .unwrap();

        assert!(engine.personalize().await.is_err());
        assert_eq!(
            engine.state().personalize.error.as_deref(),
            Some("User profile not found.")
        );
        assert_eq!(engine.display(), DisplayContent::Original);
    }

    #[tokio::test]
    async fn signed_out_transforms_send_nothing() {
        let (backend, engine) = setup(false).await;

        let err = engine.personalize().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AuthRequired));
        let err = engine.translate().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AuthRequired));

        let state = engine.state();
        assert_eq!(state.personalize.error.as_deref(), Some(PERSONALIZE_LOGIN_REQUIRED));
        assert_eq!(state.translate.error.as_deref(), Some(TRANSLATE_LOGIN_REQUIRED));
        assert!(backend.personalize_requests().is_empty());
        assert!(backend.translate_requests().is_empty());
    }

    #[tokio::test]
    async fn errors_can_be_dismissed_and_retried() {
        let (backend, engine) = setup(true).await;
        backend.script_translate(TransformReply::Reject {
            status: 503,
            body: String::new(),
        });
        assert!(engine.translate().await.is_err());
        assert_eq!(engine.state().translate.error.as_deref(), Some(TRANSLATE_FAILED));

        engine.dismiss_error(TransformOp::Translate);
        assert_eq!(engine.state().translate.error, None);

        backend.script_translate(TransformReply::Text("T".into()));
        engine.translate().await.unwrap();
        assert_eq!(engine.display_text(), "T");
    }

    // ------------------------------------------------------------------
    // Overlapping requests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn overlapping_requests_are_refused_while_personalizing() {
        let (backend, engine) = setup(true).await;
        let gate = Arc::new(Notify::new());
        backend.script_personalize(TransformReply::Gated {
            text: "P".into(),
            gate: gate.clone(),
        });

        let running = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.personalize().await })
        };
        let mut rx = engine.subscribe();
        rx.wait_for(|s| s.personalize.loading).await.unwrap();

        assert!(matches!(
            engine.personalize().await,
            Err(SessionError::Busy(TransformOp::Personalize))
        ));
        assert!(matches!(
            engine.translate().await,
            Err(SessionError::Busy(TransformOp::Translate))
        ));

        gate.notify_one();
        running.await.unwrap().unwrap();
        assert_eq!(engine.display_text(), "P");
        assert!(backend.translate_requests().is_empty());
    }

    #[tokio::test]
    async fn signed_out_attempt_leaves_the_running_request_claimed() {
        let (backend, engine) = setup(true).await;
        let gate = Arc::new(Notify::new());
        backend.script_personalize(TransformReply::Gated {
            text: "P".into(),
            gate: gate.clone(),
        });

        let running = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.personalize().await })
        };
        let mut rx = engine.subscribe();
        rx.wait_for(|s| s.personalize.loading).await.unwrap();

        engine.credentials.logout().unwrap();
        let err = engine.personalize().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AuthRequired));
        let state = engine.state();
        assert!(state.personalize.loading);
        assert_eq!(state.personalize.error.as_deref(), Some(PERSONALIZE_LOGIN_REQUIRED));

        let (token, identity) = backend.session_for("a1@example.com", Some("A1"));
        engine
            .credentials
            .login(BearerCredentials::new(token, identity))
            .unwrap();
        assert!(matches!(
            engine.personalize().await,
            Err(SessionError::Busy(TransformOp::Personalize))
        ));

        gate.notify_one();
        running.await.unwrap().unwrap();
        assert_eq!(backend.personalize_requests().len(), 1);
        assert_eq!(engine.display_text(), "P");
    }

    #[tokio::test]
    async fn dropped_request_releases_its_claim() {
        let (backend, engine) = setup(true).await;
        backend.script_translate(TransformReply::Gated {
            text: "never".into(),
            gate: Arc::new(Notify::new()),
        });

        let translating = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.translate().await })
        };
        let mut rx = engine.subscribe();
        rx.wait_for(|s| s.translate.loading).await.unwrap();

        translating.abort();
        assert!(translating.await.unwrap_err().is_cancelled());
        assert!(!engine.state().translate.loading);

        backend.script_translate(TransformReply::Text("T".into()));
        engine.translate().await.unwrap();
        assert_eq!(engine.display_text(), "T");
    }

    #[tokio::test]
    async fn translation_overtaken_by_personalization_is_discarded() {
        let (backend, engine) = setup(true).await;
        let gate = Arc::new(Notify::new());
        backend.script_translate(TransformReply::Gated {
            text: "stale".into(),
            gate: gate.clone(),
        });
        backend.script_personalize(TransformReply::Text("P".into()));

        let translating = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.translate().await })
        };
        let mut rx = engine.subscribe();
        rx.wait_for(|s| s.translate.loading).await.unwrap();

        engine.personalize().await.unwrap();
        gate.notify_one();
        translating.await.unwrap().unwrap();

        let state = engine.state();
        assert_eq!(state.translated, None);
        assert!(!state.translate.loading);
        assert_eq!(engine.display_text(), "P");
    }
}
