//! Web-facing error type with Sentry reporting.
//!
//! Handlers return `Result<T, AppError>`. Upstream and internal failures are
//! captured to Sentry; the response only ever carries the user-facing
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::session::SessionError;
use crate::storefront::StorefrontError;

/// Application-level error type for the web UI.
#[derive(Debug, Error)]
pub enum AppError {
    /// The remote API failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Reading or writing the persisted session failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The visitor must sign in first.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorefrontError> for AppError {
    fn from(err: StorefrontError) -> Self {
        match err {
            StorefrontError::Api(e) => Self::Api(e),
            StorefrontError::Cart(e) => Self::Cart(e),
            StorefrontError::Session(e) => Self::Session(e),
            StorefrontError::AdminRequired => Self::Unauthorized(err.to_string()),
            StorefrontError::PasswordMismatch | StorefrontError::MissingField(_) => {
                Self::BadRequest(err.to_string())
            }
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::RequestFailed { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::Cart(CartError::AuthenticationRequired) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Cart(CartError::Api(_)) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Text safe to show the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Cart(e) => e.user_message(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }

    /// Send server-side failures to Sentry; log the rest.
    ///
    /// Handlers that recover with a flash message or a fallback page call
    /// this directly instead of returning the error.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, "Request failed");
        }
    }

    const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::Transport(_) | ApiError::Parse { .. } | ApiError::InvalidBaseUrl(_))
                | Self::Session(_)
                | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (self.status(), self.user_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with the signed-in account.
pub fn set_sentry_user(username: &str, role: &str) {
    sentry::configure_scope(|scope| {
        let mut user = sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        };
        user.other
            .insert("role".to_string(), serde_json::Value::String(role.to_string()));
        scope.set_user(Some(user));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Removed item", Some(&[("product_id", "65f1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
