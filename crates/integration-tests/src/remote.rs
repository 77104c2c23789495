//! Loopback fake of the remote REST API.
//!
//! Serves the same paths and JSON shapes as the real store under `/api` on
//! `127.0.0.1:0`, and records every request so tests can check the path,
//! bearer header and body the client sent.
//!
//! Accounts:
//! - `alice` / `x` signs in as a user with token `T`
//! - `root` / `admin` signs in as admin with token `A`
//! - `mgr` / `x` signs in with token `M` and the unrecognized role `manager`
//! - `legacy` / `x` signs in with token `L` and a `null` role

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use atelier_core::{CartItem, Product};
use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

/// One request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct RemoteState {
    requests: Vec<RecordedRequest>,
    products: Vec<Product>,
    carts: HashMap<String, Vec<CartItem>>,
}

type Shared = Arc<Mutex<RemoteState>>;

fn lock(state: &Shared) -> MutexGuard<'_, RemoteState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Running fake server.
pub struct FakeRemote {
    base_url: Url,
    state: Shared,
}

impl FakeRemote {
    /// Bind to an ephemeral loopback port and serve `products`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(products: Vec<Product>) -> std::io::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(RemoteState {
            products,
            ..RemoteState::default()
        }));

        let api = Router::new()
            .route("/login", post(login))
            .route("/register", post(register))
            .route("/products", get(list_products).post(create_product))
            .route("/products/{id}", delete(delete_product))
            .route("/cart", get(fetch_cart))
            .route("/cart/add", post(add_to_cart))
            .route("/cart/remove/{id}", delete(remove_from_cart))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Ok(Self { base_url, state })
    }

    /// API base URL, e.g. `http://127.0.0.1:49152/api`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.state).requests.last().cloned()
    }

    /// Server-side cart for `token`.
    #[must_use]
    pub fn cart(&self, token: &str) -> Vec<CartItem> {
        lock(&self.state).carts.get(token).cloned().unwrap_or_default()
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn record(state: &Shared, method: Method, uri: &Uri, headers: &HeaderMap, body: &str) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    lock(state).requests.push(RecordedRequest {
        method,
        path: uri.path().to_owned(),
        authorization,
        body: serde_json::from_str(body).ok(),
    });
}

/// Token from `Authorization: Bearer <token>`, if it is one the fake knows.
fn bearer(headers: &HeaderMap) -> Option<&'static str> {
    match headers.get(header::AUTHORIZATION)?.to_str().ok()? {
        "Bearer T" => Some("T"),
        "Bearer A" => Some("A"),
        _ => None,
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

async fn login(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Response {
    record(&state, Method::POST, &uri, &headers, &body);
    let body: Value = serde_json::from_str(&body).unwrap_or_default();

    match (field(&body, "username"), field(&body, "password")) {
        ("alice", "x") => Json(json!({ "access_token": "T", "role": "user" })).into_response(),
        ("root", "admin") => Json(json!({ "access_token": "A", "role": "admin" })).into_response(),
        ("mgr", "x") => Json(json!({ "access_token": "M", "role": "manager" })).into_response(),
        ("legacy", "x") => Json(json!({ "access_token": "L", "role": null })).into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn register(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Response {
    record(&state, Method::POST, &uri, &headers, &body);
    let body: Value = serde_json::from_str(&body).unwrap_or_default();

    if field(&body, "username") == "alice" {
        return error(StatusCode::BAD_REQUEST, "User already exists");
    }
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    )
        .into_response()
}

async fn list_products(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    record(&state, Method::GET, &uri, &headers, "");
    let products = lock(&state).products.clone();
    Json(products).into_response()
}

async fn create_product(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Response {
    record(&state, Method::POST, &uri, &headers, &body);
    if bearer(&headers) != Some("A") {
        // Rejected without an error body.
        return StatusCode::FORBIDDEN.into_response();
    }
    let Ok(Value::Object(mut entry)) = serde_json::from_str::<Value>(&body) else {
        return error(StatusCode::BAD_REQUEST, "Invalid product");
    };
    let id = format!("new{}", lock(&state).products.len());
    entry.insert("_id".to_owned(), json!(id));
    match serde_json::from_value::<Product>(Value::Object(entry)) {
        Ok(product) => lock(&state).products.push(product),
        Err(_) => return error(StatusCode::BAD_REQUEST, "Invalid product"),
    }
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Product added successfully", "product_id": id })),
    )
        .into_response()
}

async fn delete_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    record(&state, Method::DELETE, &uri, &headers, "");
    if bearer(&headers) != Some("A") {
        return error(StatusCode::FORBIDDEN, "Admin access required");
    }
    let mut remote = lock(&state);
    let before = remote.products.len();
    remote.products.retain(|p| p.id.as_str() != id);
    if remote.products.len() == before {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    drop(remote);
    Json(json!({ "message": "Product deleted successfully" })).into_response()
}

async fn fetch_cart(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    record(&state, Method::GET, &uri, &headers, "");
    let Some(token) = bearer(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Missing token");
    };
    let items = lock(&state).carts.get(token).cloned().unwrap_or_default();
    Json(items).into_response()
}

async fn add_to_cart(
    State(state): State<Shared>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Response {
    record(&state, Method::POST, &uri, &headers, &body);
    let Some(token) = bearer(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Missing token");
    };
    let body: Value = serde_json::from_str(&body).unwrap_or_default();
    let product_id = field(&body, "product_id");

    let mut remote = lock(&state);
    let Some(product) = remote
        .products
        .iter()
        .find(|p| p.id.as_str() == product_id)
        .cloned()
    else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    let cart = remote.carts.entry(token.to_owned()).or_default();
    if cart.iter().any(|item| item.id == product.id) {
        return error(StatusCode::BAD_REQUEST, "Product already in cart");
    }
    cart.push(product.into());
    drop(remote);
    Json(json!({ "message": "Product added to cart" })).into_response()
}

async fn remove_from_cart(
    State(state): State<Shared>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    record(&state, Method::DELETE, &uri, &headers, "");
    let Some(token) = bearer(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "Missing token");
    };
    let mut remote = lock(&state);
    let cart = remote.carts.entry(token.to_owned()).or_default();
    let before = cart.len();
    cart.retain(|item| item.id.as_str() != id);
    if cart.len() == before {
        // Rejected without an error body.
        return StatusCode::NOT_FOUND.into_response();
    }
    drop(remote);
    Json(json!({ "message": "Product removed from cart" })).into_response()
}
