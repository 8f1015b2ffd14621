//! Wiring of the shared state containers.
//!
//! [`LearningSession`] creates one instance of every shared container and
//! hands clones to the components that read or write them. Nothing is
//! global; a host that needs two independent sessions builds two.

use std::sync::Arc;

use scholia_models::DocumentId;
use scholia_sdk::ScholiaClient;

use crate::account::AccountFlows;
use crate::chat::ChatSession;
use crate::config::SessionConfig;
use crate::credential_store::{Credential, CredentialStore};
use crate::document_view::{DocumentViewCoordinator, Navigator, ViewDeps};
use crate::error::SessionError;
use crate::persistence::CredentialStorage;
use crate::selection::{SelectionStore, SelectionTracker};
use crate::transform::TransformEngine;
use crate::visibility::AssistantVisibility;

/// One reader's session.
#[derive(Debug, Clone)]
pub struct LearningSession {
    config: SessionConfig,
    client: ScholiaClient,
    credentials: CredentialStore,
    tracker: SelectionTracker,
    visibility: AssistantVisibility,
    chat: ChatSession,
    accounts: AccountFlows,
    navigator: Arc<dyn Navigator>,
}

impl LearningSession {
    /// Build a session. The credential store starts unresolved; call
    /// [`start`](Self::start).
    pub fn new(
        config: SessionConfig,
        storage: Arc<dyn CredentialStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SessionError> {
        let client = ScholiaClient::new(&config.api_url)?;
        let credentials = CredentialStore::new(storage);
        let selection = SelectionStore::new();

        Ok(Self {
            tracker: SelectionTracker::new(selection.clone()),
            visibility: AssistantVisibility::new(selection.clone()),
            chat: ChatSession::new(client.clone(), credentials.clone(), selection),
            accounts: AccountFlows::new(client.clone(), credentials.clone()),
            config,
            client,
            credentials,
            navigator,
        })
    }

    /// Resolve the persisted credential.
    pub async fn start(&self) -> Credential {
        self.credentials.resolve().await
    }

    /// Open a view of `document` whose rendered body text is `original`.
    pub fn open_document(
        &self,
        document: DocumentId,
        original: impl Into<Arc<str>>,
    ) -> DocumentViewCoordinator {
        let transforms = TransformEngine::new(
            self.client.clone(),
            self.credentials.clone(),
            document,
            original,
            self.config.target_language.clone(),
        );
        let deps = ViewDeps {
            client: self.client.clone(),
            credentials: self.credentials.clone(),
            tracker: self.tracker.clone(),
            visibility: self.visibility.clone(),
            navigator: Arc::clone(&self.navigator),
            login_path: self.config.login_path.clone(),
            quiz_path: self.config.quiz_path.clone(),
        };
        DocumentViewCoordinator::new(deps, transforms)
    }

    /// The assistant panel is only offered to signed-in viewers.
    pub fn assistant_available(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Selection tracker.
    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    /// Shared selection context.
    pub fn selection(&self) -> &SelectionStore {
        self.tracker.store()
    }

    /// Assistant panel flag.
    pub fn visibility(&self) -> &AssistantVisibility {
        &self.visibility
    }

    /// Chat engine.
    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Account flows.
    pub fn accounts(&self) -> &AccountFlows {
        &self.accounts
    }
}
