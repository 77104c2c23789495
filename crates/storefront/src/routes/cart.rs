//! Cart route handlers.
//!
//! The page refreshes from the server on every load. Mutations redirect
//! back with a flash message on failure.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use atelier_core::ProductId;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{FlashQuery, redirect_with_flash};
use crate::cart::CartError;
use crate::components::{CartView, Flash, PageContext};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::guard::{RequireIdentity, SIGN_IN_PATH};
use crate::state::AppState;

/// Cart item form data.
#[derive(Debug, Deserialize)]
pub struct CartItemForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub flash: Option<Flash>,
}

/// Display the cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    _identity: RequireIdentity,
    Query(query): Query<FlashQuery>,
) -> impl IntoResponse {
    let cart = state.storefront().cart();
    if let Err(e) = cart.refresh().await {
        // Already logged by the store; the page shows the stale notice.
        debug!(error = %e, "Cart refresh failed");
    }

    CartTemplate {
        page: state.page(),
        cart: CartView::from(&cart.snapshot()),
        flash: query.into_flash(),
    }
}

/// Add an item and return to the catalog.
///
/// Anonymous shoppers are sent to sign in, with a prompt.
#[instrument(skip(state, form), fields(product_id = %form.product_id))]
pub async fn add(State(state): State<AppState>, Form(form): Form<CartItemForm>) -> Response {
    let id = ProductId::new(form.product_id);

    match state.storefront().cart().add_item(&id).await {
        Ok(()) => {
            add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));
            Redirect::to("/").into_response()
        }
        Err(e @ CartError::AuthenticationRequired) => {
            redirect_with_flash(SIGN_IN_PATH, &Flash::Error(e.user_message())).into_response()
        }
        Err(e) => redirect_with_flash("/", &Flash::Error(e.user_message())).into_response(),
    }
}

/// Remove an item and return to the cart page.
#[instrument(skip(state, form), fields(product_id = %form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    _identity: RequireIdentity,
    Form(form): Form<CartItemForm>,
) -> Response {
    let id = ProductId::new(form.product_id);

    match state.storefront().cart().remove_item(&id).await {
        Ok(()) => {
            add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.as_str())]));
            Redirect::to("/cart").into_response()
        }
        Err(e) => redirect_with_flash("/cart", &Flash::Error(e.user_message())).into_response(),
    }
}
