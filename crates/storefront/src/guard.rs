//! Access guard for privileged views.
//!
//! The decision itself is [`AccessGuard::evaluate`], a pure function of the
//! current identity. [`RequireAdmin`] and [`RequireIdentity`] apply it to
//! axum handlers: a rejected request gets a redirect with an empty body and
//! the wrapped handler never runs.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::session::Identity;
use crate::state::AppState;

/// Where anonymous visitors are sent.
pub const SIGN_IN_PATH: &str = "/login";

/// Where signed-in non-admins are sent.
pub const LANDING_PATH: &str = "/";

/// Outcome of evaluating the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// No identity: go sign in.
    RedirectToSignIn,
    /// Signed in without the admin role: back to the catalog.
    RedirectToLanding,
    /// Render the wrapped view.
    Render,
}

impl GuardDecision {
    /// Redirect target, if the view must not render.
    #[must_use]
    pub const fn redirect_target(self) -> Option<&'static str> {
        match self {
            Self::RedirectToSignIn => Some(SIGN_IN_PATH),
            Self::RedirectToLanding => Some(LANDING_PATH),
            Self::Render => None,
        }
    }
}

/// Gate for admin-only views.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard;

impl AccessGuard {
    /// Decide whether an admin view may render for `identity`.
    #[must_use]
    pub fn evaluate(identity: Option<&Identity>) -> GuardDecision {
        match identity {
            None => GuardDecision::RedirectToSignIn,
            Some(identity) if !identity.is_admin() => GuardDecision::RedirectToLanding,
            Some(_) => GuardDecision::Render,
        }
    }
}

/// Rejection produced when the guard does not allow rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardRejection(&'static str);

impl GuardRejection {
    #[must_use]
    pub const fn target(&self) -> &'static str {
        self.0
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        Redirect::to(self.0).into_response()
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor that admits only admins.
///
/// # Example
///
/// ```rust,ignore
/// async fn panel(RequireAdmin(identity): RequireAdmin) -> impl IntoResponse {
///     format!("signed in as {}", identity.role())
/// }
/// ```
#[derive(Debug)]
pub struct RequireAdmin(pub Identity);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.storefront().session().identity();
        let decision = AccessGuard::evaluate(identity.as_ref());

        match (decision.redirect_target(), identity) {
            (None, Some(identity)) => Ok(Self(identity)),
            (Some(target), _) => {
                tracing::debug!(redirect = target, "Access guard redirect");
                Err(GuardRejection(target))
            }
            (None, None) => Err(GuardRejection(SIGN_IN_PATH)),
        }
    }
}

/// Extractor that admits any signed-in shopper.
#[derive(Debug)]
pub struct RequireIdentity(pub Identity);

impl FromRequestParts<AppState> for RequireIdentity {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .storefront()
            .session()
            .identity()
            .map(Self)
            .ok_or(GuardRejection(SIGN_IN_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::Role;
    use axum::http::StatusCode;
    use secrecy::SecretString;

    fn identity(role: Role) -> Identity {
        Identity::new(SecretString::from("T"), role)
    }

    #[test]
    fn test_anonymous_redirects_to_sign_in() {
        assert_eq!(AccessGuard::evaluate(None), GuardDecision::RedirectToSignIn);
    }

    #[test]
    fn test_user_redirects_to_landing() {
        let user = identity(Role::User);
        assert_eq!(
            AccessGuard::evaluate(Some(&user)),
            GuardDecision::RedirectToLanding
        );
    }

    #[test]
    fn test_admin_renders() {
        let admin = identity(Role::Admin);
        assert_eq!(AccessGuard::evaluate(Some(&admin)), GuardDecision::Render);
        assert_eq!(GuardDecision::Render.redirect_target(), None);
    }

    #[tokio::test]
    async fn test_rejection_is_redirect_with_empty_body() {
        let response = GuardRejection(SIGN_IN_PATH).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        assert!(body.is_empty());
    }

    #[test]
    fn test_extractors_debug_without_token() {
        let admin = format!("{:?}", RequireAdmin(identity(Role::Admin)));
        let shopper = format!("{:?}", RequireIdentity(identity(Role::User)));

        assert!(admin.starts_with("RequireAdmin"));
        assert!(shopper.starts_with("RequireIdentity"));
        assert!(!admin.contains("\"T\""));
        assert!(!shopper.contains("\"T\""));
    }
}
