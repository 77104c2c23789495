//! In-process `StoreApi` double for unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use atelier_core::{CartItem, NewProduct, Price, Product, ProductId, Role};
use secrecy::{ExposeSecret, SecretString};

use crate::api::{Ack, ApiError, CreatedProduct, Credentials, LoginResponse, StoreApi};
use crate::session::{MemoryCredentialStore, SessionStore};

/// Records every call and serves a server-side cart held in memory.
#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<String>>,
    server_cart: Mutex<Vec<CartItem>>,
    products: Mutex<Vec<Product>>,
    next_failure: Mutex<Option<String>>,
    grant: Mutex<Option<(String, Role)>>,
}

impl RecordingApi {
    pub fn with_cart(items: Vec<CartItem>) -> Self {
        let api = Self::default();
        *api.server_cart.lock().unwrap_or_else(PoisonError::into_inner) = items;
        api
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let api = Self::default();
        *api.products.lock().unwrap_or_else(PoisonError::into_inner) = products;
        api
    }

    /// Token and role returned by the next successful login.
    pub fn grant(&self, token: &str, role: Role) {
        *self.grant.lock().unwrap_or_else(PoisonError::into_inner) = Some((token.to_string(), role));
    }

    /// Make the next call fail with a 400 carrying `message`.
    pub fn fail_next(&self, message: &str) {
        *self.next_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        match self.next_failure.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(message) => Err(ApiError::RequestFailed { status: 400, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoreApi for RecordingApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record(format!("login:{}", credentials.username))?;
        let (token, role) = self
            .grant
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| ("T".to_string(), Role::User));
        Ok(LoginResponse {
            access_token: SecretString::from(token),
            role,
        })
    }

    async fn register(&self, credentials: &Credentials) -> Result<Ack, ApiError> {
        self.record(format!("register:{}", credentials.username))?;
        Ok(Ack::default())
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.record("list_products".to_string())?;
        Ok(self.products.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn create_product(
        &self,
        token: &SecretString,
        product: &NewProduct,
    ) -> Result<CreatedProduct, ApiError> {
        self.record(format!("create_product:{}:{}", token.expose_secret(), product.name))?;
        Ok(CreatedProduct {
            message: Some("Product added successfully".to_string()),
            product_id: Some(ProductId::new("new")),
        })
    }

    async fn delete_product(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError> {
        self.record(format!("delete_product:{}:{id}", token.expose_secret()))?;
        Ok(Ack::default())
    }

    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartItem>, ApiError> {
        self.record(format!("fetch_cart:{}", token.expose_secret()))?;
        Ok(self.server_cart.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn add_to_cart(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError> {
        self.record(format!("add_to_cart:{}:{id}", token.expose_secret()))?;
        let mut cart = self.server_cart.lock().unwrap_or_else(PoisonError::into_inner);
        if !cart.iter().any(|item| &item.id == id) {
            cart.push(cart_item(id.as_str(), 1000));
        }
        Ok(Ack::default())
    }

    async fn remove_from_cart(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError> {
        self.record(format!("remove_from_cart:{}:{id}", token.expose_secret()))?;
        self.server_cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|item| &item.id != id);
        Ok(Ack::default())
    }
}

pub fn cart_item(id: &str, cents: u32) -> CartItem {
    CartItem {
        id: ProductId::new(id),
        name: format!("Item {id}"),
        price: Price::from_cents(cents),
        image: format!("https://img.example.com/{id}.jpg"),
    }
}

pub fn product(id: &str, cents: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Item {id}"),
        price: Price::from_cents(cents),
        image: format!("https://img.example.com/{id}.jpg"),
    }
}

/// A session already signed in as a regular user with `token`.
pub fn signed_in_session(token: &str) -> Arc<SessionStore> {
    let session = SessionStore::new(Arc::new(MemoryCredentialStore::new()));
    let _ = session.login(SecretString::from(token.to_string()), Role::User);
    Arc::new(session)
}
