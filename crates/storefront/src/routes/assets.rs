//! Themed stylesheet.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use crate::components::Palette;
use crate::state::AppState;

/// Site stylesheet with the configured palette filled in.
#[derive(Template, WebTemplate)]
#[template(path = "site.css", escape = "none")]
pub struct StylesheetTemplate {
    pub palette: Palette,
}

/// Serve the stylesheet for the configured theme.
pub async fn stylesheet(State(state): State<AppState>) -> impl IntoResponse {
    StylesheetTemplate {
        palette: state.theme().palette(),
    }
}
