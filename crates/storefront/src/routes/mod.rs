//! HTTP route handlers for the local storefront UI.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Catalog
//! GET  /health                        - Health check
//! GET  /assets/site.css               - Themed stylesheet
//!
//! # Auth
//! GET  /login                         - Sign-in page
//! POST /login                         - Sign in (admins land on /admin)
//! GET  /register                      - Registration page
//! POST /register                      - Register
//! POST /logout                        - Sign out
//!
//! # Cart (requires sign-in)
//! GET  /cart                          - Cart page, refreshed on load
//! POST /cart/add                      - Add item
//! POST /cart/remove                   - Remove item
//!
//! # Admin (admin role only)
//! GET  /admin                         - Inventory panel
//! POST /admin/products                - Create product
//! POST /admin/products/{id}/delete    - Delete product
//! ```

pub mod admin;
pub mod assets;
pub mod auth;
pub mod cart;
pub mod home;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use crate::components::Flash;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/products", post(admin::create))
        .route("/products/{id}/delete", post(admin::delete))
}

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/site.css", get(assets::stylesheet))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .nest("/cart", cart_routes())
        .nest("/admin", admin_routes())
}

// =============================================================================
// Flash Messages
// =============================================================================

/// Query parameters carrying a flash message across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl FlashQuery {
    /// The message to show, errors first.
    #[must_use]
    pub fn into_flash(self) -> Option<Flash> {
        self.error
            .map(Flash::Error)
            .or_else(|| self.success.map(Flash::Success))
    }
}

/// Redirect to `path`, carrying `flash` in the query string.
#[must_use]
pub fn redirect_with_flash(path: &str, flash: &Flash) -> Redirect {
    let key = if flash.is_error() { "error" } else { "success" };
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(key, flash.text())
        .finish();
    Redirect::to(&format!("{path}?{query}"))
}
