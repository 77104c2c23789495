//! Atelier storefront client.
//!
//! The shared library behind both front ends:
//!
//! - [`api`]: the remote REST API ([`api::StoreApi`], [`api::ApiClient`])
//! - [`session`]: the signed-in identity and its persisted credential
//! - [`cart`]: the shopping cart, synchronized with the server
//! - [`guard`]: the admin access guard
//! - [`storefront`]: the root context wiring the above together
//!
//! plus the local web UI ([`routes`], [`components`], templates) served by
//! the `atelier-storefront` binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod guard;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod storefront;

#[cfg(test)]
mod testing;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::trace::TraceLayer;

pub use storefront::{Storefront, StorefrontError};

use crate::state::AppState;

/// Build the web UI router with its middleware stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(from_fn(middleware::same_origin_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use atelier_core::Role;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::api::Credentials;
    use crate::components::Theme;
    use crate::config::StorefrontConfig;
    use crate::session::MemoryCredentialStore;
    use crate::testing::{RecordingApi, cart_item, product};

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            api_base_url: url::Url::parse("https://api.example.com/api").unwrap(),
            state_dir: std::env::temp_dir(),
            theme: Theme::Rose,
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    fn state_with(api: Arc<RecordingApi>) -> AppState {
        let storefront = Storefront::new(api, Arc::new(MemoryCredentialStore::new()));
        AppState::new(config(), storefront)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(state_with(Arc::new(RecordingApi::default())))
            .oneshot(get("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_admin_redirects_anonymous_to_login_with_empty_body() {
        let response = app(state_with(Arc::new(RecordingApi::default())))
            .oneshot(get("/admin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_admin_redirects_regular_user_to_catalog() {
        let api = Arc::new(RecordingApi::default());
        api.grant("T", Role::User);
        let state = state_with(api.clone());
        state
            .storefront()
            .login(&Credentials::new("alice", "x"))
            .await
            .unwrap();

        let response = app(state).oneshot(get("/admin")).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(!api.calls().contains(&"list_products".to_string()));
    }

    #[tokio::test]
    async fn test_catalog_marks_items_in_bag() {
        let api = Arc::new(RecordingApi::with_products(vec![
            product("p1", 1000),
            product("p2", 2500),
        ]));
        let state = state_with(api.clone());
        state
            .storefront()
            .login(&Credentials::new("alice", "x"))
            .await
            .unwrap();
        state.storefront().cart().add_item(&atelier_core::ProductId::new("p2")).await.unwrap();

        let response = app(state).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("In Bag"));
        assert!(html.contains("Added to Bag"));
        assert!(html.contains("$25.00"));
        assert!(html.contains(r#"data-theme="rose""#));
    }

    #[tokio::test]
    async fn test_catalog_shows_load_error() {
        let api = Arc::new(RecordingApi::default());
        api.fail_next("boom");
        let response = app(state_with(api)).oneshot(get("/")).await.unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Failed to load products. Please try again later."));
    }

    #[tokio::test]
    async fn test_cart_page_lists_items_and_total() {
        let api = Arc::new(RecordingApi::with_cart(vec![
            cart_item("p1", 1000),
            cart_item("p2", 550),
        ]));
        let state = state_with(api);
        state
            .storefront()
            .login(&Credentials::new("alice", "x"))
            .await
            .unwrap();

        let html = body_text(app(state).oneshot(get("/cart")).await.unwrap()).await;
        assert!(html.contains("2 items"));
        assert!(html.contains("$15.50"));
    }

    #[tokio::test]
    async fn test_anonymous_add_prompts_sign_in() {
        let api = Arc::new(RecordingApi::default());
        let request = Request::builder()
            .method("POST")
            .uri("/cart/add")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("product_id=p1"))
            .unwrap();

        let response = app(state_with(api.clone())).oneshot(request).await.unwrap();

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("/login?error="));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cross_site_post_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .header("sec-fetch-site", "cross-site")
            .body(Body::empty())
            .unwrap();

        let response = app(state_with(Arc::new(RecordingApi::default())))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_that_cannot_save_session_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let credentials = crate::session::FileCredentialStore::new(blocker.join("session.json"));
        let storefront = Storefront::new(Arc::new(RecordingApi::default()), Arc::new(credentials));
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=alice&password=x"))
            .unwrap();

        let response = app(AppState::new(config(), storefront.clone()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal server error");
        assert!(!storefront.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_stylesheet_uses_theme_palette() {
        let response = app(state_with(Arc::new(RecordingApi::default())))
            .oneshot(get("/assets/site.css"))
            .await
            .unwrap();
        let css = body_text(response).await;
        assert!(css.contains(Theme::Rose.palette().primary));
        assert!(css.contains(r#""Times New Roman""#));
    }
}
