//! The application root: API client, session and cart wired together.
//!
//! Front ends build one [`Storefront`] at startup and pass it down. Sign-in
//! and sign-out go through here so the cart always follows the session.

use std::sync::Arc;

use atelier_core::{NewProduct, Product, ProductId};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{Ack, ApiError, CreatedProduct, Credentials, StoreApi};
use crate::cart::{CartError, CartStore};
use crate::session::{CredentialStore, Identity, SessionError, SessionStore};

/// Errors from storefront-level flows.
#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Cart(#[from] CartError),

    /// Registration form: the two passwords differ. No request was sent.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// A required form field is blank. No request was sent.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Admin action attempted without the admin role. No request was sent.
    #[error("You must be logged in as admin to manage products")]
    AdminRequired,
}

impl StorefrontError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Cart(e) => e.user_message(),
            Self::Session(_) => "Could not save your session. Please try again.".to_string(),
            Self::PasswordMismatch | Self::MissingField(_) | Self::AdminRequired => {
                self.to_string()
            }
        }
    }
}

/// Root context owning the API client and both stores.
#[derive(Clone)]
pub struct Storefront {
    api: Arc<dyn StoreApi>,
    session: Arc<SessionStore>,
    cart: Arc<CartStore>,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("session", &self.session)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Wire up an anonymous storefront.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, credentials: Arc<dyn CredentialStore>) -> Self {
        let session = Arc::new(SessionStore::new(credentials));
        let cart = Arc::new(CartStore::new(Arc::clone(&api), Arc::clone(&session)));
        Self { api, session, cart }
    }

    #[must_use]
    pub fn api(&self) -> &Arc<dyn StoreApi> {
        &self.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Restore the persisted session and, if signed in, load the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file exists but cannot be read.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Option<Identity>, StorefrontError> {
        let identity = self.session.initialize()?;
        self.cart.sync_identity().await;
        Ok(identity)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in, persist the identity and load the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is blank, the server rejects the
    /// credentials, or the session cannot be persisted.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, StorefrontError> {
        require(&credentials.username, "Username")?;
        require(credentials.password.expose_secret(), "Password")?;

        let grant = self.api.login(credentials).await?;
        let identity = self.session.login(grant.access_token, grant.role)?;
        self.cart.sync_identity().await;

        info!(role = %identity.role(), "Login complete");
        Ok(identity)
    }

    /// Register a regular user account.
    ///
    /// The confirmation is checked locally before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::PasswordMismatch`] if the passwords differ,
    /// or the API error if the server rejects the registration.
    #[instrument(skip(self, credentials, confirm_password), fields(username = %credentials.username))]
    pub async fn register(
        &self,
        credentials: &Credentials,
        confirm_password: &str,
    ) -> Result<Ack, StorefrontError> {
        require(&credentials.username, "Username")?;
        require(credentials.password.expose_secret(), "Password")?;
        if credentials.password.expose_secret() != confirm_password {
            return Err(StorefrontError::PasswordMismatch);
        }

        let ack = self.api.register(credentials).await?;
        info!("Registration complete");
        Ok(ack)
    }

    /// Sign out: forget the identity and empty the cart locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be erased. The
    /// in-memory identity and cart are cleared regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), StorefrontError> {
        let erased = self.session.logout();
        self.cart.sync_identity().await;
        if let Err(e) = &erased {
            warn!(error = %e, "Failed to erase persisted session");
        }
        erased.map_err(Into::into)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns the API error if the catalog cannot be loaded.
    pub async fn products(&self) -> Result<Vec<Product>, StorefrontError> {
        Ok(self.api.list_products().await?)
    }

    /// Create a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::AdminRequired`] without a request unless
    /// signed in as admin; otherwise the API error on rejection.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<CreatedProduct, StorefrontError> {
        let admin = self.require_admin()?;
        let created = self.api.create_product(admin.token(), product).await?;
        info!(product_id = ?created.product_id, "Product created");
        Ok(created)
    }

    /// Delete a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::AdminRequired`] without a request unless
    /// signed in as admin; otherwise the API error on rejection.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<Ack, StorefrontError> {
        let admin = self.require_admin()?;
        let ack = self.api.delete_product(admin.token(), id).await?;
        info!("Product deleted");
        Ok(ack)
    }

    fn require_admin(&self) -> Result<Identity, StorefrontError> {
        self.session
            .identity()
            .filter(Identity::is_admin)
            .ok_or(StorefrontError::AdminRequired)
    }
}

fn require(value: &str, field: &'static str) -> Result<(), StorefrontError> {
    if value.trim().is_empty() {
        return Err(StorefrontError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::MemoryCredentialStore;
    use crate::testing::{RecordingApi, cart_item};
    use atelier_core::{Price, Role};

    fn storefront(api: Arc<RecordingApi>) -> (Storefront, Arc<MemoryCredentialStore>) {
        let persisted = Arc::new(MemoryCredentialStore::new());
        (Storefront::new(api, persisted.clone()), persisted)
    }

    #[tokio::test]
    async fn test_login_sets_identity_and_fetches_cart() {
        let api = Arc::new(RecordingApi::default());
        api.grant("T", Role::User);
        let (storefront, persisted) = storefront(api.clone());

        let identity = storefront.login(&Credentials::new("alice", "x")).await.unwrap();

        assert_eq!(identity.token().expose_secret(), "T");
        assert_eq!(identity.role(), Role::User);
        assert_eq!(api.calls(), vec!["login:alice", "fetch_cart:T"]);
        assert_eq!(persisted.snapshot().unwrap().user_role.as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn test_failed_login_stays_anonymous() {
        let api = Arc::new(RecordingApi::default());
        api.fail_next("Invalid credentials");
        let (storefront, persisted) = storefront(api.clone());

        let err = storefront.login(&Credentials::new("alice", "bad")).await.unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(storefront.session().identity().is_none());
        assert!(persisted.snapshot().is_none());
        assert_eq!(api.calls(), vec!["login:alice"]);
    }

    #[tokio::test]
    async fn test_blank_username_sends_nothing() {
        let api = Arc::new(RecordingApi::default());
        let (storefront, _) = storefront(api.clone());

        let err = storefront.login(&Credentials::new("  ", "x")).await.unwrap_err();
        assert!(matches!(err, StorefrontError::MissingField("Username")));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_checks_confirmation_locally() {
        let api = Arc::new(RecordingApi::default());
        let (storefront, _) = storefront(api.clone());

        let err = storefront
            .register(&Credentials::new("bob", "one"), "two")
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Passwords do not match");
        assert!(api.calls().is_empty());

        storefront
            .register(&Credentials::new("bob", "one"), "one")
            .await
            .unwrap();
        assert_eq!(api.calls(), vec!["register:bob"]);
    }

    #[tokio::test]
    async fn test_logout_clears_cart_without_request() {
        let api = Arc::new(RecordingApi::with_cart(vec![cart_item("p1", 1000)]));
        let (storefront, persisted) = storefront(api.clone());
        storefront.login(&Credentials::new("alice", "x")).await.unwrap();
        assert_eq!(storefront.cart().len(), 1);
        let calls = api.calls().len();

        storefront.logout().await.unwrap();

        assert!(storefront.cart().is_empty());
        assert!(persisted.snapshot().is_none());
        assert_eq!(api.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_initialize_restores_and_fetches() {
        let api = Arc::new(RecordingApi::with_cart(vec![cart_item("p1", 1000)]));
        let persisted = Arc::new(MemoryCredentialStore::with_session(
            crate::session::PersistedSession {
                auth_token: "T".to_string(),
                user_role: Some("admin".to_string()),
            },
        ));
        let storefront = Storefront::new(api.clone(), persisted);

        let identity = storefront.initialize().await.unwrap().unwrap();

        assert!(identity.is_admin());
        assert_eq!(storefront.cart().len(), 1);
        assert_eq!(api.calls(), vec!["fetch_cart:T"]);
    }

    #[tokio::test]
    async fn test_product_admin_actions_require_admin() {
        let api = Arc::new(RecordingApi::default());
        api.grant("T", Role::User);
        let (storefront, _) = storefront(api.clone());
        storefront.login(&Credentials::new("alice", "x")).await.unwrap();
        let calls = api.calls().len();

        let product = NewProduct::new("Hoops", Price::from_cents(4500), "https://img").unwrap();
        assert!(matches!(
            storefront.create_product(&product).await,
            Err(StorefrontError::AdminRequired)
        ));
        assert!(matches!(
            storefront.delete_product(&ProductId::new("p1")).await,
            Err(StorefrontError::AdminRequired)
        ));
        assert_eq!(api.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_admin_can_create_and_delete() {
        let api = Arc::new(RecordingApi::default());
        api.grant("A", Role::Admin);
        let (storefront, _) = storefront(api.clone());
        storefront.login(&Credentials::new("root", "x")).await.unwrap();

        let product = NewProduct::new("Hoops", Price::from_cents(4500), "https://img").unwrap();
        let created = storefront.create_product(&product).await.unwrap();
        assert_eq!(created.product_id, Some(ProductId::new("new")));
        storefront.delete_product(&ProductId::new("p9")).await.unwrap();

        let calls = api.calls();
        assert!(calls.contains(&"create_product:A:Hoops".to_string()));
        assert!(calls.contains(&"delete_product:A:p9".to_string()));
    }
}
