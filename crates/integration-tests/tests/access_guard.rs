//! Admin gating in the local web UI.
//!
//! Run with: cargo test -p atelier-integration-tests --test access_guard

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use atelier_core::Role;
use atelier_integration_tests::scripted::ScriptedApi;
use atelier_integration_tests::{product, storefront};
use atelier_storefront::api::{Credentials, Operation};
use atelier_storefront::app;
use atelier_storefront::components::Theme;
use atelier_storefront::config::{DEFAULT_API_BASE_URL, StorefrontConfig};
use atelier_storefront::state::AppState;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

fn shop() -> ScriptedApi {
    ScriptedApi::new()
        .with_account("alice", "T", Role::User)
        .with_account("root", "A", Role::Admin)
        .with_products(vec![product("p1", 1000), product("p2", 2500)])
}

fn config() -> StorefrontConfig {
    StorefrontConfig {
        api_base_url: url::Url::parse(DEFAULT_API_BASE_URL).unwrap(),
        state_dir: std::env::temp_dir(),
        theme: Theme::Amber,
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Web UI state, signed in as `username` when given.
async fn signed_in(api: &Arc<ScriptedApi>, username: Option<&str>) -> AppState {
    let (storefront, _) = storefront(api.clone());
    if let Some(username) = username {
        storefront
            .login(&Credentials::new(username, "pw"))
            .await
            .unwrap();
    }
    AppState::new(config(), storefront)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Redirects
// ============================================================================

#[tokio::test]
async fn test_anonymous_is_sent_to_login_without_rendering() {
    let api = Arc::new(shop());
    let state = signed_in(&api, None).await;

    for request in [
        get("/admin"),
        post_form("/admin/products", "name=Hoops&price=10&image=https%3A%2F%2Fimg%2Fh.jpg"),
        post_form("/admin/products/p1/delete", ""),
    ] {
        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(body_text(response).await.is_empty());
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_regular_user_is_sent_to_catalog() {
    let api = Arc::new(shop());
    let state = signed_in(&api, Some("alice")).await;
    let calls_after_login = api.calls().len();

    let response = app(state.clone()).oneshot(get("/admin")).await.unwrap();
    assert_eq!(location(&response), "/");
    assert!(body_text(response).await.is_empty());

    let response = app(state)
        .oneshot(post_form("/admin/products/p1/delete", ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/");

    assert_eq!(api.calls().len(), calls_after_login);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_sees_inventory() {
    let api = Arc::new(shop());
    let state = signed_in(&api, Some("root")).await;

    let response = app(state).oneshot(get("/admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Inventory"));
    assert!(html.contains("Item p1"));
    assert!(html.contains("/admin/products/p2/delete"));
}

#[tokio::test]
async fn test_admin_creates_product() {
    let api = Arc::new(shop());
    let state = signed_in(&api, Some("root")).await;

    let response = app(state)
        .oneshot(post_form(
            "/admin/products",
            "name=Hoops&price=12.50&image=https%3A%2F%2Fimg.example%2Fh.jpg",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/admin?success=Product+added+successfully%21"
    );
    let create = api
        .calls()
        .into_iter()
        .find(|c| c.operation == Operation::CreateProduct)
        .unwrap();
    assert_eq!(create.token.as_deref(), Some("A"));
    assert_eq!(create.argument.as_deref(), Some("Hoops"));
}

#[tokio::test]
async fn test_invalid_price_never_reaches_api() {
    let api = Arc::new(shop());
    let state = signed_in(&api, Some("root")).await;

    let response = app(state)
        .oneshot(post_form(
            "/admin/products",
            "name=Hoops&price=-3&image=https%3A%2F%2Fimg.example%2Fh.jpg",
        ))
        .await
        .unwrap();

    assert!(location(&response).starts_with("/admin?error="));
    assert_eq!(api.count(Operation::CreateProduct), 0);
}

#[tokio::test]
async fn test_admin_delete_surfaces_server_error() {
    let api = Arc::new(shop());
    api.fail_next(Operation::DeleteProduct, 404, "Product not found");
    let state = signed_in(&api, Some("root")).await;

    let response = app(state)
        .oneshot(post_form("/admin/products/missing/delete", ""))
        .await
        .unwrap();

    assert_eq!(location(&response), "/admin?error=Product+not+found");
}

#[tokio::test]
async fn test_logout_revokes_admin_access() {
    let api = Arc::new(shop());
    let state = signed_in(&api, Some("root")).await;

    let response = app(state.clone())
        .oneshot(post_form("/logout", ""))
        .await
        .unwrap();
    assert_eq!(location(&response), "/");

    let response = app(state).oneshot(get("/admin")).await.unwrap();
    assert_eq!(location(&response), "/login");
}
