//! Sign-in, registration and sign-out handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{FlashQuery, redirect_with_flash};
use crate::api::Credentials;
use crate::components::{Flash, PageContext};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::state::AppState;
use crate::storefront::StorefrontError;

/// Generic sign-in failure text; the server's reason is only logged.
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Shown on the sign-in page after registering.
pub const REGISTERED: &str = "Registration successful! Please sign in.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub flash: Option<Flash>,
    pub username: String,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub username: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the sign-in page.
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<FlashQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        page: state.page(),
        flash: query.into_flash(),
        username: String::new(),
    }
}

/// Handle sign-in form submission.
///
/// Admins land on the inventory panel, everyone else on the catalog. A
/// session that cannot be saved is a server error, not a bad password.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = Credentials::new(form.username.trim(), form.password);

    match state.storefront().login(&credentials).await {
        Ok(identity) => {
            set_sentry_user(&credentials.username, identity.role().as_str());
            let target = if identity.is_admin() { "/admin" } else { "/" };
            Ok(Redirect::to(target).into_response())
        }
        Err(e @ StorefrontError::Session(_)) => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "Login failed");
            let message = match e {
                StorefrontError::MissingField(_) => e.to_string(),
                _ => LOGIN_FAILED.to_string(),
            };
            Ok(LoginTemplate {
                page: state.page(),
                flash: Some(Flash::Error(message)),
                username: credentials.username,
            }
            .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(State(state): State<AppState>) -> impl IntoResponse {
    RegisterTemplate {
        page: state.page(),
        error: None,
        username: String::new(),
    }
}

/// Handle registration form submission.
///
/// Password confirmation is checked before anything is sent; server-side
/// rejections show the server's message.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let credentials = Credentials::new(form.username.trim(), form.password);

    match state
        .storefront()
        .register(&credentials, &form.confirm_password)
        .await
    {
        Ok(_) => redirect_with_flash("/login", &Flash::Success(REGISTERED.to_string()))
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Registration failed");
            RegisterTemplate {
                page: state.page(),
                error: Some(e.user_message()),
                username: credentials.username,
            }
            .into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out and return to the catalog.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Redirect {
    if let Err(e) = state.storefront().logout().await {
        // Identity and cart are already cleared in memory.
        AppError::from(e).report();
    }
    clear_sentry_user();
    Redirect::to("/")
}
