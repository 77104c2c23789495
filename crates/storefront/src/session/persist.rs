//! Durable storage for the signed-in session.
//!
//! Two slots are kept, `auth_token` and `user_role`, stored together as one
//! JSON document. On Unix the file is created with mode `0600` inside a
//! `0700` directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("persisted session at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The persisted key/value slots.
///
/// `user_role` is kept as raw text; unknown values are resolved by the
/// session store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub auth_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("auth_token", &"[REDACTED]")
            .field("user_role", &self.user_role)
            .finish()
    }
}

/// Backing storage for the session slots.
pub trait CredentialStore: Send + Sync {
    /// Read the slots. `Ok(None)` when nothing has been persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage exists but cannot be read or decoded.
    fn load(&self) -> Result<Option<PersistedSession>, PersistError>;

    /// Overwrite both slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, session: &PersistedSession) -> Result<(), PersistError>;

    /// Erase both slots. Erasing absent slots is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if existing storage cannot be removed.
    fn clear(&self) -> Result<(), PersistError>;
}

// =============================================================================
// File Store
// =============================================================================

/// Session slots stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<PersistedSession>, PersistError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        let session: PersistedSession =
            serde_json::from_str(&raw).map_err(|source| PersistError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        Ok(Some(session).filter(|s| !s.auth_token.is_empty()))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!(dir = %parent.display(), error = %e, "Failed to restrict state directory");
                }
            }
        }

        let body = serde_json::to_vec_pretty(session)?;
        fs::write(&self.path, body).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process session slots, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<PersistedSession>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with slots already filled, as if a previous run had signed in.
    #[must_use]
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }

    /// Current slot contents.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<PersistedSession>, PersistError> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), PersistError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> PersistedSession {
        PersistedSession {
            auth_token: "T".to_string(),
            user_role: Some("admin".to_string()),
        }
    }

    #[test]
    fn test_file_store_save_load_clear_cycle() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileCredentialStore::new(tmp.path().join("nested").join("session.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_uses_expected_slot_names() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileCredentialStore::new(tmp.path().join("session.json"));
        store.save(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["auth_token"], "T");
        assert_eq!(raw["user_role"], "admin");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileCredentialStore::new(tmp.path().join("session.json"));
        store.save(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "session file should be 0600");
    }

    #[test]
    fn test_file_store_clear_without_file_is_ok() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileCredentialStore::new(tmp.path().join("session.json"));
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(matches!(store.load(), Err(PersistError::Corrupt { .. })));
    }

    #[test]
    fn test_file_store_ignores_blank_token() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        fs::write(&path, r#"{"auth_token": ""}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("\"T\""));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryCredentialStore::new();
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        store.clear().unwrap();
        assert_eq!(store.snapshot(), None);
    }
}
