//! Application state shared across handlers.

use std::sync::Arc;

use crate::components::{PageContext, Theme};
use crate::config::StorefrontConfig;
use crate::storefront::Storefront;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; every handler sees the same storefront
/// context, so the web UI serves a single shopper.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: Storefront,
}

impl AppState {
    /// Create a new application state around an already initialized
    /// storefront.
    #[must_use]
    pub fn new(config: StorefrontConfig, storefront: Storefront) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, storefront }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn storefront(&self) -> &Storefront {
        &self.inner.storefront
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.inner.config.theme
    }

    /// Palette and navbar data for rendering a page.
    #[must_use]
    pub fn page(&self) -> PageContext {
        PageContext::new(self.theme(), self.storefront())
    }
}
