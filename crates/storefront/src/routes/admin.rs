//! Admin inventory panel.
//!
//! Every handler takes [`RequireAdmin`], so nothing here runs for anonymous
//! visitors or regular shoppers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use atelier_core::{NewProduct, Price, ProductId};
use serde::Deserialize;
use tracing::instrument;

use super::{FlashQuery, redirect_with_flash};
use crate::components::{Flash, InventoryRowView, PageContext};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::guard::RequireAdmin;
use crate::state::AppState;

pub const PRODUCT_ADDED: &str = "Product added successfully!";
pub const PRODUCT_DELETED: &str = "Product deleted successfully!";

/// New product form data.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub image: String,
}

impl ProductForm {
    /// Validate the form into a product submission.
    fn parse(&self) -> Result<NewProduct, String> {
        let price = self
            .price
            .trim()
            .parse::<Price>()
            .map_err(|e| capitalize(&e.to_string()))?;
        NewProduct::new(&self.name, price, &self.image).map_err(|e| capitalize(&e.to_string()))
    }
}

/// Inventory panel template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub page: PageContext,
    pub rows: Vec<InventoryRowView>,
    pub load_error: Option<String>,
    pub flash: Option<Flash>,
}

/// Display the inventory panel.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<FlashQuery>,
) -> impl IntoResponse {
    let (rows, load_error) = match state.storefront().products().await {
        Ok(products) => (products.iter().map(InventoryRowView::from).collect(), None),
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            (Vec::new(), Some(err.user_message()))
        }
    };

    AdminTemplate {
        page: state.page(),
        rows,
        load_error,
        flash: query.into_flash(),
    }
}

/// Create a product.
#[instrument(skip(state, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Form(form): Form<ProductForm>,
) -> Redirect {
    let product = match form.parse() {
        Ok(product) => product,
        Err(message) => return redirect_with_flash("/admin", &Flash::Error(message)),
    };

    match state.storefront().create_product(&product).await {
        Ok(_) => {
            add_breadcrumb("admin", "Created product", Some(&[("name", &product.name)]));
            redirect_with_flash("/admin", &Flash::Success(PRODUCT_ADDED.to_string()))
        }
        Err(e) => redirect_with_flash("/admin", &Flash::Error(e.user_message())),
    }
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Redirect {
    let id = ProductId::new(id);

    match state.storefront().delete_product(&id).await {
        Ok(_) => {
            add_breadcrumb("admin", "Deleted product", Some(&[("product_id", id.as_str())]));
            redirect_with_flash("/admin", &Flash::Success(PRODUCT_DELETED.to_string()))
        }
        Err(e) => redirect_with_flash("/admin", &Flash::Error(e.user_message())),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
