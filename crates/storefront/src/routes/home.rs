//! Catalog page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use super::FlashQuery;
use crate::components::{Flash, PageContext, ProductCardView, catalog_cards};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Shown in place of the grid when the catalog cannot be loaded.
pub const LOAD_ERROR: &str = "Failed to load products. Please try again later.";

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub page: PageContext,
    pub cards: Vec<ProductCardView>,
    pub load_error: Option<&'static str>,
    pub flash: Option<Flash>,
}

/// Display the product catalog, marking items already in the bag.
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<FlashQuery>,
) -> impl IntoResponse {
    let storefront = state.storefront();

    let (cards, load_error) = match storefront.products().await {
        Ok(products) => (catalog_cards(&products, &storefront.cart().snapshot()), None),
        Err(e) => {
            AppError::from(e).report();
            (Vec::new(), Some(LOAD_ERROR))
        }
    };

    CatalogTemplate {
        page: state.page(),
        cards,
        load_error,
        flash: query.into_flash(),
    }
}
