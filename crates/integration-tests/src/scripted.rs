//! In-process [`StoreApi`] double.
//!
//! Carts are kept per token, so switching identities sees different carts.
//! Each operation can be told to fail once, and cart fetches can be held
//! open until the test releases them with a chosen response.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use atelier_core::{CartItem, NewProduct, Product, ProductId, Role};
use atelier_storefront::api::{
    Ack, ApiError, CreatedProduct, Credentials, LoginResponse, Operation, StoreApi,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::oneshot;

/// One recorded call. `token` is the bearer value, if the call carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub token: Option<String>,
    pub argument: Option<String>,
}

impl Call {
    fn new(operation: Operation, token: Option<&SecretString>, argument: Option<&str>) -> Self {
        Self {
            operation,
            token: token.map(|t| t.expose_secret().to_owned()),
            argument: argument.map(str::to_owned),
        }
    }
}

/// Test side of a held cart fetch.
pub struct FetchGate {
    entered: oneshot::Receiver<()>,
    respond: oneshot::Sender<Result<Vec<CartItem>, ApiError>>,
}

impl FetchGate {
    /// Wait until the held fetch has reached the server.
    pub async fn entered(&mut self) {
        let _ = (&mut self.entered).await;
    }

    /// Let the fetch finish with `items`.
    pub fn respond(self, items: Vec<CartItem>) {
        let _ = self.respond.send(Ok(items));
    }

    /// Let the fetch finish with a 500.
    pub fn fail(self) {
        let _ = self.respond.send(Err(ApiError::RequestFailed {
            status: 500,
            message: Operation::FetchCart.fallback_message().to_owned(),
        }));
    }
}

/// Server side of a held cart fetch.
struct HeldFetch {
    entered: oneshot::Sender<()>,
    response: oneshot::Receiver<Result<Vec<CartItem>, ApiError>>,
}

#[derive(Default)]
struct Server {
    calls: Vec<Call>,
    accounts: HashMap<String, (String, Role)>,
    carts: HashMap<String, Vec<CartItem>>,
    products: Vec<Product>,
    failures: HashMap<Operation, (u16, String)>,
    held_fetches: VecDeque<HeldFetch>,
}

/// Scripted remote store.
#[derive(Default)]
pub struct ScriptedApi {
    server: Mutex<Server>,
}

impl ScriptedApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Server> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept `username` at login, granting `token` and `role`.
    #[must_use]
    pub fn with_account(self, username: &str, token: &str, role: Role) -> Self {
        self.lock()
            .accounts
            .insert(username.to_owned(), (token.to_owned(), role));
        self
    }

    /// Seed the server-side cart for `token`.
    #[must_use]
    pub fn with_cart(self, token: &str, items: Vec<CartItem>) -> Self {
        self.lock().carts.insert(token.to_owned(), items);
        self
    }

    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.lock().products = products;
        self
    }

    /// Make the next call of `operation` fail with `status` and `message`.
    pub fn fail_next(&self, operation: Operation, status: u16, message: &str) {
        self.lock()
            .failures
            .insert(operation, (status, message.to_owned()));
    }

    /// Hold the next cart fetch open until the returned gate is released.
    #[must_use]
    pub fn hold_next_fetch(&self) -> FetchGate {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (respond_tx, respond_rx) = oneshot::channel();
        self.lock().held_fetches.push_back(HeldFetch {
            entered: entered_tx,
            response: respond_rx,
        });
        FetchGate {
            entered: entered_rx,
            respond: respond_tx,
        }
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Operations called so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().calls.iter().map(|c| c.operation).collect()
    }

    /// Number of calls of `operation`.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Current server-side cart for `token`.
    #[must_use]
    pub fn server_cart(&self, token: &str) -> Vec<CartItem> {
        self.lock().carts.get(token).cloned().unwrap_or_default()
    }

    /// Record `call` and apply any scripted failure for its operation.
    fn record(&self, call: Call) -> Result<(), ApiError> {
        let mut server = self.lock();
        let operation = call.operation;
        server.calls.push(call);
        match server.failures.remove(&operation) {
            Some((status, message)) => Err(ApiError::RequestFailed { status, message }),
            None => Ok(()),
        }
    }

    fn product_for_cart(&self, id: &ProductId) -> CartItem {
        self.lock()
            .products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .map_or_else(|| crate::cart_item(id.as_str(), 1000), CartItem::from)
    }
}

#[async_trait]
impl StoreApi for ScriptedApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record(Call::new(
            Operation::Login,
            None,
            Some(credentials.username.as_str()),
        ))?;
        let account = self.lock().accounts.get(&credentials.username).cloned();
        let (token, role) = account.ok_or_else(|| ApiError::RequestFailed {
            status: 401,
            message: "Invalid credentials".to_owned(),
        })?;
        Ok(LoginResponse {
            access_token: SecretString::from(token),
            role,
        })
    }

    async fn register(&self, credentials: &Credentials) -> Result<Ack, ApiError> {
        self.record(Call::new(
            Operation::Register,
            None,
            Some(credentials.username.as_str()),
        ))?;
        Ok(Ack {
            message: Some("User registered successfully".to_owned()),
        })
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.record(Call::new(Operation::ListProducts, None, None))?;
        Ok(self.lock().products.clone())
    }

    async fn create_product(
        &self,
        token: &SecretString,
        product: &NewProduct,
    ) -> Result<CreatedProduct, ApiError> {
        self.record(Call::new(
            Operation::CreateProduct,
            Some(token),
            Some(product.name.as_str()),
        ))?;
        let id = ProductId::new(format!("new-{}", product.name.to_lowercase()));
        self.lock().products.push(Product {
            id: id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
        });
        Ok(CreatedProduct {
            message: Some("Product added successfully".to_owned()),
            product_id: Some(id),
        })
    }

    async fn delete_product(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError> {
        self.record(Call::new(
            Operation::DeleteProduct,
            Some(token),
            Some(id.as_str()),
        ))?;
        self.lock().products.retain(|p| &p.id != id);
        Ok(Ack::default())
    }

    async fn fetch_cart(&self, token: &SecretString) -> Result<Vec<CartItem>, ApiError> {
        self.record(Call::new(Operation::FetchCart, Some(token), None))?;

        let held = self.lock().held_fetches.pop_front();
        if let Some(held) = held {
            let _ = held.entered.send(());
            return held.response.await.unwrap_or_else(|_| {
                Err(ApiError::RequestFailed {
                    status: 503,
                    message: Operation::FetchCart.fallback_message().to_owned(),
                })
            });
        }

        Ok(self.server_cart(token.expose_secret()))
    }

    async fn add_to_cart(&self, token: &SecretString, id: &ProductId) -> Result<Ack, ApiError> {
        self.record(Call::new(
            Operation::AddToCart,
            Some(token),
            Some(id.as_str()),
        ))?;
        let item = self.product_for_cart(id);
        let mut server = self.lock();
        let cart = server
            .carts
            .entry(token.expose_secret().to_owned())
            .or_default();
        if cart.iter().any(|existing| &existing.id == id) {
            return Err(ApiError::RequestFailed {
                status: 400,
                message: "Product already in cart".to_owned(),
            });
        }
        cart.push(item);
        drop(server);
        Ok(Ack {
            message: Some("Product added to cart".to_owned()),
        })
    }

    async fn remove_from_cart(
        &self,
        token: &SecretString,
        id: &ProductId,
    ) -> Result<Ack, ApiError> {
        self.record(Call::new(
            Operation::RemoveFromCart,
            Some(token),
            Some(id.as_str()),
        ))?;
        let mut server = self.lock();
        let cart = server
            .carts
            .entry(token.expose_secret().to_owned())
            .or_default();
        let before = cart.len();
        cart.retain(|item| &item.id != id);
        if cart.len() == before {
            return Err(ApiError::RequestFailed {
                status: 404,
                message: "Product not in cart".to_owned(),
            });
        }
        drop(server);
        Ok(Ack {
            message: Some("Product removed from cart".to_owned()),
        })
    }
}
