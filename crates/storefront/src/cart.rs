//! Shopping cart state, kept in step with the remote cart.
//!
//! # States
//!
//! - [`CartPhase::Anonymous`]: no identity, empty sequence, no server calls.
//! - [`CartPhase::Synced`]: identity present, sequence mirrors the server.
//!
//! Entries only enter the local sequence from a successful fetch. An add is
//! confirmed by re-fetching; a remove drops the entry locally once the server
//! acknowledges it.
//!
//! Every fetch takes a sequence number. A response is applied only if its
//! number is still the latest issued, and identity changes advance the
//! counter, so a slow response for a previous identity is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use atelier_core::{CartItem, Price, ProductId};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, StoreApi};
use crate::session::{Identity, SessionStore};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation needs a signed-in shopper. No request was sent.
    #[error("Please log in to add items to your cart")]
    AuthenticationRequired,

    /// The remote API rejected or failed the call.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CartError {
    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationRequired => self.to_string(),
            Self::Api(e) => e.user_message(),
        }
    }
}

/// Coarse cart state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartPhase {
    /// No identity; the cart is empty and nothing is fetched.
    #[default]
    Anonymous,
    /// Identity present; contents come from the server.
    Synced,
}

/// Whether a finished fetch was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the local sequence.
    Applied,
    /// A newer fetch or an identity change superseded this one.
    Superseded,
}

/// Point-in-time view of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub phase: CartPhase,
    /// A fetch is in flight.
    pub loading: bool,
    /// The latest fetch failed; `items` may not match the server.
    pub stale: bool,
}

impl CartSnapshot {
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }
}

#[derive(Default)]
struct CartState {
    items: Vec<CartItem>,
    phase: CartPhase,
    /// Identity the contents belong to.
    owner: Option<Identity>,
    latest_fetch: u64,
    loading: bool,
    stale: bool,
}

impl CartState {
    /// Drop contents and invalidate in-flight fetches.
    fn reset(&mut self, owner: Option<Identity>) {
        self.items.clear();
        self.phase = CartPhase::Anonymous;
        self.owner = owner;
        self.latest_fetch += 1;
        self.loading = false;
        self.stale = false;
    }
}

/// The shopper's cart.
pub struct CartStore {
    api: Arc<dyn StoreApi>,
    session: Arc<SessionStore>,
    state: Mutex<CartState>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty, anonymous cart. Call
    /// [`sync_identity`](Self::sync_identity) to pick up the session.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(CartState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Identity transitions
    // =========================================================================

    /// Follow the session's identity.
    ///
    /// - anonymous to signed in: fetch the cart
    /// - signed in to anonymous: clear locally, no server call
    /// - one token to another: clear, then fetch
    ///
    /// Fetch failures are logged and leave the cart empty.
    #[instrument(skip(self))]
    pub async fn sync_identity(&self) {
        let current = self.session.identity();

        let needs_fetch = {
            let mut state = self.lock();
            let same_owner = match (state.owner.as_ref(), current.as_ref()) {
                (Some(owner), Some(identity)) => owner.same_token(identity),
                _ => false,
            };
            match current {
                None if state.owner.is_none() => false,
                None => {
                    debug!("Identity cleared, emptying cart");
                    state.reset(None);
                    false
                }
                Some(identity) if same_owner => {
                    state.owner = Some(identity);
                    false
                }
                Some(identity) => {
                    debug!("New identity, fetching cart");
                    state.reset(Some(identity));
                    true
                }
            }
        };

        if needs_fetch {
            // Failure is already logged and recorded as stale.
            let _ = self.refresh().await;
        }
    }

    // =========================================================================
    // Server operations
    // =========================================================================

    /// Replace the local sequence with the server's cart.
    ///
    /// On failure the local sequence is kept and the snapshot is flagged
    /// stale.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AuthenticationRequired`] when anonymous, or the
    /// API error if the fetch failed.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<FetchOutcome, CartError> {
        let (seq, identity) = {
            let mut state = self.lock();
            let identity = state
                .owner
                .clone()
                .ok_or(CartError::AuthenticationRequired)?;
            state.latest_fetch += 1;
            state.loading = true;
            (state.latest_fetch, identity)
        };

        let result = self.api.fetch_cart(identity.token()).await;

        let mut state = self.lock();
        if state.latest_fetch != seq {
            debug!(seq, latest = state.latest_fetch, "Discarding superseded cart response");
            return Ok(FetchOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(items) => {
                state.items = dedup_by_id(items);
                state.phase = CartPhase::Synced;
                state.stale = false;
                debug!(count = state.items.len(), "Cart synchronized");
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart, keeping local contents");
                state.stale = true;
                Err(e.into())
            }
        }
    }

    /// Add a product, then re-fetch the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AuthenticationRequired`] without any request when
    /// anonymous. If the add is rejected the cart is unchanged and the API
    /// error is returned.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_item(&self, id: &ProductId) -> Result<(), CartError> {
        let identity = self.owner_or_prompt()?;

        if let Err(e) = self.api.add_to_cart(identity.token(), id).await {
            warn!(error = %e, "Failed to add product to cart");
            return Err(e.into());
        }
        info!("Added product to cart");

        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(e) => {
                // The add itself succeeded; the cart is flagged stale.
                debug!(error = %e, "Cart refresh after add failed");
                Ok(())
            }
        }
    }

    /// Remove a product; the local entry goes only once the server confirms.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AuthenticationRequired`] without any request when
    /// anonymous. If the removal is rejected the cart is unchanged and the API
    /// error is returned.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_item(&self, id: &ProductId) -> Result<(), CartError> {
        let identity = self.owner_or_prompt()?;

        if let Err(e) = self.api.remove_from_cart(identity.token(), id).await {
            warn!(error = %e, "Failed to remove product from cart");
            return Err(e.into());
        }

        let mut state = self.lock();
        let still_same_owner = state
            .owner
            .as_ref()
            .is_some_and(|owner| owner.same_token(&identity));
        if still_same_owner {
            state.items.retain(|item| &item.id != id);
        }
        info!("Removed product from cart");
        Ok(())
    }

    fn owner_or_prompt(&self) -> Result<Identity, CartError> {
        self.lock()
            .owner
            .clone()
            .ok_or(CartError::AuthenticationRequired)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current contents, in server order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.lock().items.iter().any(|item| &item.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Sum of item prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lock().items.iter().map(|item| item.price).sum()
    }

    #[must_use]
    pub fn phase(&self) -> CartPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let state = self.lock();
        CartSnapshot {
            items: state.items.clone(),
            phase: state.phase,
            loading: state.loading,
            stale: state.stale,
        }
    }
}

/// Keep the first entry for each product id.
fn dedup_by_id(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
