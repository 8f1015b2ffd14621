//! Per-document view coordinator.
//!
//! A [`DocumentViewCoordinator`] hosts one displayed document. It enforces
//! the authentication gate, registers the document's viewport with the
//! selection tracker, forwards "Ask AI" clicks to the assistant panel, and
//! exposes the transform engine's output as the rendered body.
//!
//! ```text
//!                ┌── signed out ──► Redirecting   (terminal for this mount)
//! CheckingAuth ──┤
//!                └── signed in ───► Ready { has_profile }
//!                                     │
//!                                     └── logout + reconcile ──► Redirecting
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use scholia_models::DocumentId;
use scholia_sdk::ScholiaClient;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::credential_store::CredentialStore;
use crate::error::SessionError;
use crate::selection::{Affordance, SelectionTracker, ViewportId, ViewportRegistration};
use crate::transform::{DisplayContent, OperationStatus, TransformEngine};
use crate::visibility::AssistantVisibility;

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Host navigation.
///
/// Navigation is always a full page load, which also discards in-memory
/// state of the page being left.
pub trait Navigator: Send + Sync + std::fmt::Debug {
    /// Load `target` (a path with optional query).
    fn hard_navigate(&self, target: &str);
}

/// Why the viewer was sent to the login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RedirectReason {
    /// Gated content opened without a credential.
    UnauthorizedContent,
}

/// A performed redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Navigation target, e.g. `/login?reason=unauthorized_content`.
    pub target: String,
    /// Reason code carried in the target.
    pub reason: RedirectReason,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle phase of a document view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewPhase {
    /// Waiting for the credential store to resolve.
    CheckingAuth,
    /// The viewer was sent away; nothing is rendered.
    Redirecting(Redirect),
    /// The document is shown.
    Ready {
        /// Whether the viewer has completed the background quiz.
        has_profile: bool,
    },
}

/// What the primary transform button did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    /// Personalized the document.
    Personalize,
    /// Sent the viewer to the background quiz.
    TakeQuiz,
}

/// Render model of the view.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentView {
    /// Authentication not resolved; nothing actionable.
    Pending,
    /// Redirected; nothing rendered.
    Redirected,
    /// Body and controls.
    Ready {
        /// Body text to show.
        body: String,
        /// Which primary action the transform button performs.
        primary_action: PrimaryAction,
        /// Personalize loading/error.
        personalize: OperationStatus,
        /// Translate loading/error.
        translate: OperationStatus,
        /// Whether the translation is on screen.
        showing_translation: bool,
        /// "Ask AI" affordance.
        affordance: Affordance,
    },
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Host of one displayed document.
#[derive(Debug)]
pub struct DocumentViewCoordinator {
    client: ScholiaClient,
    credentials: CredentialStore,
    tracker: SelectionTracker,
    visibility: AssistantVisibility,
    transforms: TransformEngine,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    quiz_path: String,
    phase: watch::Sender<ViewPhase>,
    viewport: Mutex<Option<ViewportRegistration>>,
}

/// Collaborators of a [`DocumentViewCoordinator`].
#[derive(Debug, Clone)]
pub struct ViewDeps {
    /// Backend client.
    pub client: ScholiaClient,
    /// Credential store.
    pub credentials: CredentialStore,
    /// Selection tracker.
    pub tracker: SelectionTracker,
    /// Assistant panel flag.
    pub visibility: AssistantVisibility,
    /// Host navigation.
    pub navigator: Arc<dyn Navigator>,
    /// Login surface.
    pub login_path: String,
    /// Background quiz surface.
    pub quiz_path: String,
}

impl DocumentViewCoordinator {
    /// A view of the document transformed by `transforms`, in
    /// [`ViewPhase::CheckingAuth`].
    pub fn new(deps: ViewDeps, transforms: TransformEngine) -> Self {
        let (phase, _) = watch::channel(ViewPhase::CheckingAuth);
        Self {
            client: deps.client,
            credentials: deps.credentials,
            tracker: deps.tracker,
            visibility: deps.visibility,
            transforms,
            navigator: deps.navigator,
            login_path: deps.login_path,
            quiz_path: deps.quiz_path,
            phase,
            viewport: Mutex::new(None),
        }
    }

    /// The displayed document.
    pub fn document(&self) -> &DocumentId {
        self.transforms.document()
    }

    /// The document's transform engine.
    pub fn transforms(&self) -> &TransformEngine {
        &self.transforms
    }

    /// Current phase.
    pub fn phase(&self) -> ViewPhase {
        self.phase.borrow().clone()
    }

    /// Observe phase changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewPhase> {
        self.phase.subscribe()
    }

    /// The registered viewport, while attached and ready.
    pub fn viewport(&self) -> Option<ViewportId> {
        self.viewport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(ViewportRegistration::id)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Mount the view: wait for the credential, then redirect or become
    /// ready. Calling again after the first run returns the current phase.
    pub async fn attach(&self) -> ViewPhase {
        if *self.phase.borrow() != ViewPhase::CheckingAuth {
            return self.phase();
        }

        let credential = self.credentials.resolved().await;
        let Some(bearer) = credential.bearer() else {
            return self.redirect();
        };

        let has_profile = match self.client.fetch_profile(&bearer.token).await {
            Ok(record) => record.has_profile(),
            Err(e) => {
                warn!(document = %self.document(), error = %e, "profile check failed");
                false
            }
        };

        // The credential may have been dropped while the profile was loading.
        if !self.credentials.is_authenticated() {
            return self.redirect();
        }

        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(self.tracker.attach(self.document().clone()));
        self.phase.send_if_modified(|phase| {
            if *phase != ViewPhase::CheckingAuth {
                return false;
            }
            *phase = ViewPhase::Ready { has_profile };
            true
        });
        info!(document = %self.document(), has_profile, "document view ready");
        self.phase()
    }

    /// Unmount the view, releasing its viewport registration.
    pub fn detach(&self) {
        if self
            .viewport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            debug!(document = %self.document(), "document view detached");
        }
    }

    /// Re-check the gate against the current credential: a ready view
    /// whose viewer has signed out is redirected.
    pub fn reconcile(&self) -> ViewPhase {
        let ready = matches!(*self.phase.borrow(), ViewPhase::Ready { .. });
        let credential = self.credentials.state();
        if ready && !credential.is_loading() && !credential.is_authenticated() {
            return self.redirect();
        }
        self.phase()
    }

    fn redirect(&self) -> ViewPhase {
        self.detach();
        let reason = RedirectReason::UnauthorizedContent;
        let target = format!("{}?reason={reason}", self.login_path);

        let first = self.phase.send_if_modified(|phase| {
            if matches!(phase, ViewPhase::Redirecting(_)) {
                return false;
            }
            *phase = ViewPhase::Redirecting(Redirect {
                target: target.clone(),
                reason,
            });
            true
        });
        if first {
            info!(document = %self.document(), %target, "unauthenticated; redirecting");
            self.navigator.hard_navigate(&target);
        }
        self.phase()
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    /// Handle a click on the "Ask AI" affordance: open the assistant when a
    /// selection from this document is pending. Returns whether it opened.
    pub fn ask_ai(&self) -> bool {
        if !matches!(*self.phase.borrow(), ViewPhase::Ready { .. }) {
            return false;
        }
        let pending = self.tracker.store().current();
        if pending.document_id() != Some(self.document()) {
            return false;
        }
        debug!(document = %self.document(), "ask AI");
        self.visibility.open();
        true
    }

    /// Run the primary transform button: personalize for viewers with a
    /// background profile, otherwise go to the quiz.
    pub async fn run_primary_action(&self) -> Result<PrimaryAction, SessionError> {
        let has_profile = match *self.phase.borrow() {
            ViewPhase::Ready { has_profile } => has_profile,
            _ => return Err(SessionError::NotReady),
        };
        if has_profile {
            self.transforms.personalize().await?;
            Ok(PrimaryAction::Personalize)
        } else {
            info!(document = %self.document(), "no background profile; opening quiz");
            self.navigator.hard_navigate(&self.quiz_path);
            Ok(PrimaryAction::TakeQuiz)
        }
    }

    /// Build the render model.
    pub fn render(&self) -> DocumentView {
        let has_profile = match *self.phase.borrow() {
            ViewPhase::CheckingAuth => return DocumentView::Pending,
            ViewPhase::Redirecting(_) => return DocumentView::Redirected,
            ViewPhase::Ready { has_profile } => has_profile,
        };
        let state = self.transforms.state();
        let display = state.display();
        DocumentView::Ready {
            body: display.text(self.transforms.original()).to_string(),
            primary_action: if has_profile {
                PrimaryAction::Personalize
            } else {
                PrimaryAction::TakeQuiz
            },
            personalize: state.personalize,
            translate: state.translate,
            showing_translation: matches!(display, DisplayContent::Translated(_)),
            affordance: self.tracker.affordance(),
        }
    }
}
