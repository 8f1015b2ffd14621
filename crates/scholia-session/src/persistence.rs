//! Durable storage for the bearer credential.
//!
//! Two entries are kept: the opaque token and the serialized identity
//! record. They are written and removed together; a lone entry is treated
//! as no credential at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use scholia_models::Identity;
use scholia_sdk::BearerCredentials;
use tracing::debug;

use crate::error::StorageError;

/// File holding the bearer token.
pub const TOKEN_FILE: &str = "auth_token";
/// File holding the identity record as JSON.
pub const IDENTITY_FILE: &str = "user.json";

/// Backing store for [`CredentialStore`](crate::CredentialStore).
///
/// Calls are synchronous: a `save` or `clear` that returns `Ok` is durable.
pub trait CredentialStorage: Send + Sync + std::fmt::Debug {
    /// Read the stored credential. `Ok(None)` when nothing (or only one of
    /// the two entries) is stored.
    fn load(&self) -> Result<Option<BearerCredentials>, StorageError>;

    /// Overwrite the stored credential.
    fn save(&self, credentials: &BearerCredentials) -> Result<(), StorageError>;

    /// Remove both entries.
    fn clear(&self) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

/// Credential storage in a directory on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStorage {
    dir: PathBuf,
}

impl FileCredentialStorage {
    /// Store entries under `dir`; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the configured directory.
    pub fn from_dir(dir: Option<&Path>) -> Result<Self, StorageError> {
        dir.map(Self::new).ok_or(StorageError::NoLocation)
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_optional(path: &Path) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_optional(path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn load(&self) -> Result<Option<BearerCredentials>, StorageError> {
        let token = Self::read_optional(&self.dir.join(TOKEN_FILE))?;
        let identity = Self::read_optional(&self.dir.join(IDENTITY_FILE))?;

        match (token, identity) {
            (Some(token), Some(identity)) if !token.trim().is_empty() => {
                let identity: Identity = serde_json::from_str(&identity)?;
                Ok(Some(BearerCredentials::new(token.trim(), identity)))
            }
            (None, None) => Ok(None),
            _ => {
                debug!(dir = %self.dir.display(), "incomplete stored credential ignored");
                Ok(None)
            }
        }
    }

    fn save(&self, credentials: &BearerCredentials) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let identity = serde_json::to_string_pretty(&credentials.identity)?;
        let token_tmp = self.dir.join(format!("{TOKEN_FILE}.tmp"));
        let identity_tmp = self.dir.join(format!("{IDENTITY_FILE}.tmp"));
        fs::write(&token_tmp, &credentials.token)?;
        fs::write(&identity_tmp, identity)?;

        // The token goes last: an interruption after this point leaves at
        // most a lone identity, which loads as no credential.
        Self::remove_optional(&self.dir.join(TOKEN_FILE))?;
        fs::rename(&identity_tmp, self.dir.join(IDENTITY_FILE))?;
        fs::rename(&token_tmp, self.dir.join(TOKEN_FILE))?;
        debug!(dir = %self.dir.display(), "credential saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        Self::remove_optional(&self.dir.join(TOKEN_FILE))?;
        Self::remove_optional(&self.dir.join(IDENTITY_FILE))?;
        debug!(dir = %self.dir.display(), "credential cleared");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory storage
// ---------------------------------------------------------------------------

/// Process-local storage, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStorage {
    slot: Mutex<Option<BearerCredentials>>,
}

impl MemoryCredentialStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `credentials`.
    pub fn with(credentials: BearerCredentials) -> Self {
        Self {
            slot: Mutex::new(Some(credentials)),
        }
    }

    /// What is currently stored.
    pub fn stored(&self) -> Option<BearerCredentials> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn load(&self) -> Result<Option<BearerCredentials>, StorageError> {
        Ok(self.stored())
    }

    fn save(&self, credentials: &BearerCredentials) -> Result<(), StorageError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_models::UserId;

    fn sample() -> BearerCredentials {
        BearerCredentials::new(
            "tok-1",
            Identity::new(UserId::new(1), "a1@example.com").with_name("A1"),
        )
    }

    #[test]
    fn file_storage_round_trips_both_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("nested"));
        assert!(storage.load().unwrap().is_none());

        storage.save(&sample()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample()));

        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
        assert!(!storage.dir().join(TOKEN_FILE).exists());
    }

    #[test]
    fn save_replaces_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCredentialStorage::new(dir.path());
        storage.save(&sample()).unwrap();

        let next = BearerCredentials::new("tok-2", Identity::new(UserId::new(2), "b2@example.com"));
        storage.save(&next).unwrap();
        assert_eq!(storage.load().unwrap(), Some(next));
        assert!(!dir.path().join("auth_token.tmp").exists());
        assert!(!dir.path().join("user.json.tmp").exists());
    }

    #[test]
    fn failed_save_keeps_the_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCredentialStorage::new(dir.path());
        storage.save(&sample()).unwrap();

        // A directory in the way makes the identity write fail.
        fs::create_dir(dir.path().join("user.json.tmp")).unwrap();
        let next = BearerCredentials::new("tok-2", Identity::new(UserId::new(2), "b2@example.com"));
        assert!(matches!(storage.save(&next), Err(StorageError::Io(_))));
        assert_eq!(storage.load().unwrap(), Some(sample()));
    }

    #[test]
    fn token_without_identity_loads_as_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKEN_FILE), "tok-1").unwrap();
        let storage = FileCredentialStorage::new(dir.path());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_identity_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKEN_FILE), "tok-1").unwrap();
        fs::write(dir.path().join(IDENTITY_FILE), "{not json").unwrap();
        let storage = FileCredentialStorage::new(dir.path());
        assert!(matches!(storage.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn clearing_empty_storage_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        FileCredentialStorage::new(dir.path()).clear().unwrap();
    }

    #[test]
    fn missing_location_is_reported() {
        assert!(matches!(
            FileCredentialStorage::from_dir(None),
            Err(StorageError::NoLocation)
        ));
    }

    #[test]
    fn memory_storage() {
        let storage = MemoryCredentialStorage::with(sample());
        assert_eq!(storage.load().unwrap(), Some(sample()));
        storage.clear().unwrap();
        assert!(storage.stored().is_none());
    }
}
