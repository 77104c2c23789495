//! Integration test support for the Atelier storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atelier-integration-tests
//! ```
//!
//! Nothing here talks to the real store. Two doubles stand in for it:
//!
//! - [`scripted::ScriptedApi`] - an in-process `StoreApi` with per-token
//!   carts, one-shot failures and held cart fetches for ordering tests
//! - [`remote::FakeRemote`] - a loopback axum server speaking the remote
//!   REST API, for driving the real `reqwest` client end to end
//!
//! # Test Categories
//!
//! - `cart_sync` - cart synchronization with identity changes and mutations
//! - `session_lifecycle` - sign-in, sign-out and the persisted session file
//! - `access_guard` - admin gating in the web UI
//! - `api_client` - HTTP paths, headers and error translation

pub mod remote;
pub mod scripted;

use std::sync::Arc;

use atelier_core::{CartItem, Price, Product, ProductId};
use atelier_storefront::Storefront;
use atelier_storefront::session::MemoryCredentialStore;

/// A cart entry with a predictable name and image.
#[must_use]
pub fn cart_item(id: &str, cents: u32) -> CartItem {
    CartItem {
        id: ProductId::new(id),
        name: format!("Item {id}"),
        price: Price::from_cents(cents),
        image: format!("https://img.example.com/{id}.jpg"),
    }
}

/// A catalog product with a predictable name and image.
#[must_use]
pub fn product(id: &str, cents: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Item {id}"),
        price: Price::from_cents(cents),
        image: format!("https://img.example.com/{id}.jpg"),
    }
}

/// An anonymous storefront over `api` with an in-memory credential slot.
#[must_use]
pub fn storefront(api: Arc<scripted::ScriptedApi>) -> (Storefront, Arc<MemoryCredentialStore>) {
    let credentials = Arc::new(MemoryCredentialStore::new());
    (Storefront::new(api, credentials.clone()), credentials)
}

/// Product ids in cart order.
#[must_use]
pub fn ids(items: &[CartItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}
