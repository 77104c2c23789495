//! `reqwest` implementation of [`StoreApi`].

use std::sync::Arc;

use async_trait::async_trait;
use atelier_core::{CartItem, NewProduct, Product, ProductId, Role};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::types::{
    AddToCartBody, CredentialsBody, LoginBody, server_error_message,
};
use super::{Ack, ApiError, CreatedProduct, Credentials, LoginResponse, Operation, StoreApi};

/// HTTP client for the remote storefront API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: &Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &Url) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: base_url.clone(),
            }),
        }
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments (each percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and read the whole body.
    ///
    /// Non-success statuses become [`ApiError::RequestFailed`].
    async fn execute(&self, operation: Operation, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(%operation, error = %e, "Request to storefront API failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = server_error_message(&body)
                .unwrap_or_else(|| operation.fallback_message().to_string());
            warn!(
                %operation,
                status = %status,
                message = %message,
                "Storefront API returned non-success status"
            );
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        debug!(%operation, status = %status, "Storefront API call succeeded");
        Ok(body)
    }

    /// Send a request and parse a JSON body.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.execute(operation, request).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                %operation,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse {
                operation,
                detail: e.to_string(),
            }
        })
    }

    /// Send a request whose success body is only an acknowledgement.
    async fn execute_ack(&self, operation: Operation, request: RequestBuilder) -> Result<Ack, ApiError> {
        let body = self.execute(operation, request).await?;
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}

#[async_trait]
impl StoreApi for ApiClient {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let body = CredentialsBody {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
            role: None,
        };
        let request = self
            .inner
            .client
            .post(self.endpoint(&["login"])?)
            .json(&body);

        let login: LoginBody = self.execute_json(Operation::Login, request).await?;

        // A 2xx without a token is still a failed sign-in.
        let access_token = login
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::RequestFailed {
                status: 200,
                message: Operation::Login.fallback_message().to_string(),
            })?;

        Ok(LoginResponse {
            access_token: SecretString::from(access_token),
            role: Role::resolve(login.role.as_deref()),
        })
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn register(&self, credentials: &Credentials) -> Result<Ack, ApiError> {
        let body = CredentialsBody {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
            role: Some(Role::User),
        };
        let request = self
            .inner
            .client
            .post(self.endpoint(&["register"])?)
            .json(&body);

        self.execute_ack(Operation::Register, request).await
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let request = self.inner.client.get(self.endpoint(&["products"])?);
        let products: Vec<Product> = self.execute_json(Operation::ListProducts, request).await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self, token, product), fields(name = %product.name))]
    async fn create_product(
        &self,
        token: &SecretString,
        product: &NewProduct,
    ) -> Result<CreatedProduct, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["products"])?)
            .bearer_auth(token.expose_secret())
            .json(product);

        let body = self.execute(Operation::CreateProduct, request).await?;
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn delete_product(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&["products", id.as_str()])?)
            .bearer_auth(token.expose_secret());

        self.execute_ack(Operation::DeleteProduct, request).await
    }

    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartItem>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["cart"])?)
            .bearer_auth(token.expose_secret());

        let items: Vec<CartItem> = self.execute_json(Operation::FetchCart, request).await?;
        debug!(count = items.len(), "Fetched cart");
        Ok(items)
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn add_to_cart(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["cart", "add"])?)
            .bearer_auth(token.expose_secret())
            .json(&AddToCartBody { product_id: id });

        self.execute_ack(Operation::AddToCart, request).await
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn remove_from_cart(
        &self,
        token: &SecretString,
        id: &ProductId,
    ) -> Result<Ack, ApiError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&["cart", "remove", id.as_str()])?)
            .bearer_auth(token.expose_secret());

        self.execute_ack(Operation::RemoveFromCart, request).await
    }
}
