//! The credential store: single owner of the bearer credential.
//!
//! State lives in a [`watch`] channel. `login` and `logout` are the only
//! writers once the initial [`resolve`](CredentialStore::resolve) has run;
//! both persist before publishing, and subscribers observe the new state
//! before the call returns.

use std::sync::Arc;

use scholia_models::Identity;
use scholia_sdk::BearerCredentials;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::StorageError;
use crate::persistence::CredentialStorage;

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Snapshot of the credential state.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    token: Option<String>,
    identity: Option<Identity>,
    loading: bool,
}

impl Credential {
    /// Initial state: persisted storage not read yet.
    pub fn resolving() -> Self {
        Self {
            token: None,
            identity: None,
            loading: true,
        }
    }

    /// Resolved, no credential.
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::resolving()
        }
    }

    /// Resolved, holding `credentials`.
    pub fn signed_in(credentials: BearerCredentials) -> Self {
        Self {
            token: Some(credentials.token),
            identity: Some(credentials.identity),
            loading: false,
        }
    }

    /// The bearer token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The identity record.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// `true` until the persisted credential has been read.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// `true` when both token and identity are present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.identity.is_some()
    }

    /// Token and identity as a pair, when authenticated.
    pub fn bearer(&self) -> Option<BearerCredentials> {
        match (&self.token, &self.identity) {
            (Some(token), Some(identity)) => {
                Some(BearerCredentials::new(token.clone(), identity.clone()))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Shared handle to the credential state. Clones share one state.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    state: Arc<watch::Sender<Credential>>,
    storage: Arc<dyn CredentialStorage>,
}

impl CredentialStore {
    /// A store in the [`resolving`](Credential::resolving) state.
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        let (tx, _) = watch::channel(Credential::resolving());
        Self {
            state: Arc::new(tx),
            storage,
        }
    }

    /// Read persisted storage once and leave the loading state.
    ///
    /// Unreadable storage resolves as signed out. Calling again after the
    /// store has resolved, or after a `login`/`logout` raced ahead, has no
    /// effect.
    pub async fn resolve(&self) -> Credential {
        if !self.state.borrow().is_loading() {
            return self.state();
        }

        let storage = Arc::clone(&self.storage);
        let loaded = match tokio::task::spawn_blocking(move || storage.load()).await {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                warn!(error = %e, "stored credential unreadable; starting signed out");
                None
            }
            Err(e) => {
                warn!(error = %e, "credential load task failed; starting signed out");
                None
            }
        };

        let resolved = match loaded {
            Some(credentials) => {
                info!(user = %credentials.identity.id, "restored stored credential");
                Credential::signed_in(credentials)
            }
            None => Credential::signed_out(),
        };

        self.state.send_if_modified(|current| {
            if current.is_loading() {
                *current = resolved;
                true
            } else {
                false
            }
        });
        self.state()
    }

    /// Wait until the store has resolved and return the state.
    pub async fn resolved(&self) -> Credential {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|c| !c.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Store `credentials`, overwriting any previous ones.
    ///
    /// The in-memory state is updated even if persisting fails; the error
    /// is returned so the caller can report it.
    pub fn login(&self, credentials: BearerCredentials) -> Result<(), StorageError> {
        let persisted = self.storage.save(&credentials);
        if let Err(e) = &persisted {
            warn!(error = %e, "failed to persist credential");
        }
        info!(user = %credentials.identity.id, "signed in");
        self.state.send_replace(Credential::signed_in(credentials));
        persisted
    }

    /// Forget the credential, in memory and in storage.
    pub fn logout(&self) -> Result<(), StorageError> {
        let cleared = self.storage.clear();
        if let Err(e) = &cleared {
            warn!(error = %e, "failed to clear stored credential");
        }
        info!("signed out");
        self.state.send_replace(Credential::signed_out());
        cleared
    }

    /// Current state.
    pub fn state(&self) -> Credential {
        self.state.borrow().clone()
    }

    /// Token and identity, when authenticated.
    pub fn bearer(&self) -> Option<BearerCredentials> {
        self.state.borrow().bearer()
    }

    /// `true` when authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<Credential> {
        self.state.subscribe()
    }
}
