//! The signed-in identity and its persistence.
//!
//! [`SessionStore`] is the only writer of the persisted credential slots.
//! A persisted token is trusted as-is on startup; there is no validation
//! round-trip and no expiry handling.

mod persist;

pub use persist::{CredentialStore, FileCredentialStore, MemoryCredentialStore, PersistError, PersistedSession};

use std::sync::{Arc, PoisonError, RwLock};

use atelier_core::Role;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Persist(#[from] PersistError),

    #[error("credential token cannot be empty")]
    EmptyToken,
}

/// An authenticated identity: the bearer token and the role granted with it.
///
/// The token never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct Identity {
    token: SecretString,
    role: Role,
}

impl Identity {
    #[must_use]
    pub const fn new(token: SecretString, role: Role) -> Self {
        Self { token, role }
    }

    /// The bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether both identities carry the same token.
    #[must_use]
    pub fn same_token(&self, other: &Self) -> bool {
        self.token.expose_secret() == other.token.expose_secret()
    }
}

/// Holds the current [`Identity`], mirrored to a [`CredentialStore`].
pub struct SessionStore {
    persist: Arc<dyn CredentialStore>,
    identity: RwLock<Option<Identity>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an anonymous store. Call [`initialize`](Self::initialize) to
    /// pick up a persisted session.
    #[must_use]
    pub fn new(persist: Arc<dyn CredentialStore>) -> Self {
        Self {
            persist,
            identity: RwLock::new(None),
        }
    }

    /// Restore the identity from the persisted slots, if any.
    ///
    /// A missing or unrecognized role restores as [`Role::User`]. A corrupt
    /// session file is logged and treated as signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session storage exists but cannot be read.
    #[instrument(skip(self))]
    pub fn initialize(&self) -> Result<Option<Identity>, SessionError> {
        let restored = match self.persist.load() {
            Ok(slots) => slots.map(restore_identity),
            Err(PersistError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "Ignoring corrupt persisted session");
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(identity) = &restored {
            info!(role = %identity.role(), "Restored persisted session");
        }

        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = restored.clone();
        Ok(restored)
    }

    /// Persist the token and role, then make them the current identity.
    ///
    /// If persisting fails the current identity is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or the slots cannot be written.
    #[instrument(skip(self, token))]
    pub fn login(&self, token: SecretString, role: Role) -> Result<Identity, SessionError> {
        if token.expose_secret().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        self.persist.save(&PersistedSession {
            auth_token: token.expose_secret().to_owned(),
            user_role: Some(role.as_str().to_owned()),
        })?;

        let identity = Identity::new(token, role);
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = Some(identity.clone());
        info!(%role, "Signed in");
        Ok(identity)
    }

    /// Drop the current identity and erase the persisted slots.
    ///
    /// The in-memory identity is cleared even if erasing fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted slots cannot be erased.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), SessionError> {
        self.identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.persist.clear()?;
        info!("Signed out");
        Ok(())
    }

    /// The current identity, or `None` when anonymous.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Role of the current identity, `None` when anonymous.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Identity::role)
    }
}

fn restore_identity(slots: PersistedSession) -> Identity {
    let role = Role::resolve(slots.user_role.as_deref());
    Identity::new(SecretString::from(slots.auth_token), role)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn persisted(token: &str, role: Option<&str>) -> PersistedSession {
        PersistedSession {
            auth_token: token.to_string(),
            user_role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_initialize_without_persisted_session_is_anonymous() {
        let store = SessionStore::new(Arc::new(MemoryCredentialStore::new()));
        assert!(store.initialize().unwrap().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_initialize_restores_token_and_role() {
        let backing = MemoryCredentialStore::with_session(persisted("T", Some("admin")));
        let store = SessionStore::new(Arc::new(backing));

        let identity = store.initialize().unwrap().unwrap();
        assert_eq!(identity.token().expose_secret(), "T");
        assert_eq!(identity.role(), Role::Admin);
        assert_eq!(store.role(), Some(Role::Admin));
    }

    #[test]
    fn test_initialize_defaults_unknown_role_to_user() {
        for role in [None, Some("superuser")] {
            let backing = MemoryCredentialStore::with_session(persisted("T", role));
            let store = SessionStore::new(Arc::new(backing));
            assert_eq!(store.initialize().unwrap().unwrap().role(), Role::User);
        }
    }

    #[test]
    fn test_initialize_treats_corrupt_file_as_signed_out() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = SessionStore::new(Arc::new(FileCredentialStore::new(&path)));
        assert!(store.initialize().unwrap().is_none());
    }

    #[test]
    fn test_login_persists_both_slots() {
        let backing = Arc::new(MemoryCredentialStore::new());
        let store = SessionStore::new(backing.clone());

        let identity = store.login(SecretString::from("T"), Role::User).unwrap();
        assert_eq!(identity.token().expose_secret(), "T");
        assert_eq!(backing.snapshot(), Some(persisted("T", Some("user"))));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_login_rejects_empty_token() {
        let backing = Arc::new(MemoryCredentialStore::new());
        let store = SessionStore::new(backing.clone());

        assert!(matches!(
            store.login(SecretString::from(""), Role::User),
            Err(SessionError::EmptyToken)
        ));
        assert!(backing.snapshot().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_logout_erases_slots() {
        let backing = Arc::new(MemoryCredentialStore::new());
        let store = SessionStore::new(backing.clone());
        store.login(SecretString::from("T"), Role::Admin).unwrap();

        store.logout().unwrap();
        assert!(store.identity().is_none());
        assert!(backing.snapshot().is_none());
    }

    #[test]
    fn test_session_survives_restart_through_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("session.json");

        let first = SessionStore::new(Arc::new(FileCredentialStore::new(&path)));
        first.login(SecretString::from("T"), Role::Admin).unwrap();

        let second = SessionStore::new(Arc::new(FileCredentialStore::new(&path)));
        let restored = second.initialize().unwrap().unwrap();
        assert_eq!(restored.token().expose_secret(), "T");
        assert!(restored.is_admin());
    }

    #[test]
    fn test_same_token() {
        let a = Identity::new(SecretString::from("T"), Role::User);
        let b = Identity::new(SecretString::from("T"), Role::Admin);
        let c = Identity::new(SecretString::from("U"), Role::User);
        assert!(a.same_token(&b));
        assert!(!a.same_token(&c));
    }

    #[test]
    fn test_identity_debug_hides_token() {
        let identity = Identity::new(SecretString::from("super-secret"), Role::User);
        assert!(!format!("{identity:?}").contains("super-secret"));
    }
}
