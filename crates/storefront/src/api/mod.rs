//! Client for the remote storefront REST API.
//!
//! # Architecture
//!
//! - [`StoreApi`] declares one method per remote operation; the stores only
//!   talk to the API through this trait, so tests can substitute a double.
//! - [`ApiClient`] implements it over `reqwest`: one request per call, no
//!   retries, no timeouts, no caching.
//! - Every non-success status becomes [`ApiError::RequestFailed`] carrying the
//!   server's `error` field when present, else a fixed per-operation message.
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_storefront::api::{ApiClient, Credentials, StoreApi};
//!
//! let client = ApiClient::new(&config.api_base_url);
//! let grant = client.login(&Credentials::new("alice", "x")).await?;
//! let cart = client.fetch_cart(&grant.access_token).await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use async_trait::async_trait;
use atelier_core::{CartItem, NewProduct, Product, ProductId};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur when calling the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connection, TLS, ...).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Server-supplied error text, or the operation's fallback message.
        message: String,
    },

    /// The server answered 2xx but the body was not the expected JSON.
    #[error("Invalid response from {operation}: {detail}")]
    Parse {
        operation: Operation,
        detail: String,
    },

    /// The configured base URL cannot carry path segments.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP status of a rejected request, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::RequestFailed { message, .. } => message.clone(),
            Self::Transport(_) => "Could not reach the store. Please try again.".to_string(),
            Self::Parse { operation, .. } => operation.fallback_message().to_string(),
            Self::InvalidBaseUrl(_) => "The store address is misconfigured.".to_string(),
        }
    }
}

/// Remote operations, used for log fields and fallback error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    Register,
    ListProducts,
    CreateProduct,
    DeleteProduct,
    FetchCart,
    AddToCart,
    RemoveFromCart,
}

impl Operation {
    /// Message used when the server rejects the call without an `error` field.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Login => "Invalid login credentials",
            Self::Register => "Registration failed",
            Self::ListProducts => "Failed to fetch products",
            Self::CreateProduct => "Failed to add product",
            Self::DeleteProduct => "Failed to delete product",
            Self::FetchCart => "Failed to fetch cart",
            Self::AddToCart => "Failed to add product to cart",
            Self::RemoveFromCart => "Failed to remove product from cart",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::ListProducts => "list_products",
            Self::CreateProduct => "create_product",
            Self::DeleteProduct => "delete_product",
            Self::FetchCart => "fetch_cart",
            Self::AddToCart => "add_to_cart",
            Self::RemoveFromCart => "remove_from_cart",
        };
        f.write_str(name)
    }
}

/// The remote storefront API, one method per endpoint.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// `POST /login`
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// `POST /register` (always as a regular user)
    async fn register(&self, credentials: &Credentials) -> Result<Ack, ApiError>;

    /// `GET /products`
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    /// `POST /products` (admin)
    async fn create_product(
        &self,
        token: &SecretString,
        product: &NewProduct,
    ) -> Result<CreatedProduct, ApiError>;

    /// `DELETE /products/{id}` (admin)
    async fn delete_product(&self, token: &SecretString, id: &ProductId)
    -> Result<Ack, ApiError>;

    /// `GET /cart`
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartItem>, ApiError>;

    /// `POST /cart/add`
    async fn add_to_cart(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError>;

    /// `DELETE /cart/remove/{id}`
    async fn remove_from_cart(
        &self,
        token: &SecretString,
        id: &ProductId,
    ) -> Result<Ack, ApiError>;
}
