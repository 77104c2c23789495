//! Command implementations.
//!
//! Each command takes the shared [`Storefront`] and writes its human-readable
//! result to `out`; failures come back as [`CommandError`].

pub mod auth;
pub mod cart;
pub mod products;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use atelier_storefront::api::ApiClient;
use atelier_storefront::cart::CartError;
use atelier_storefront::config::{ConfigError, StorefrontConfig};
use atelier_storefront::session::FileCredentialStore;
use atelier_storefront::{Storefront, StorefrontError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Environment configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The storefront rejected the operation.
    #[error("{}", .0.user_message())]
    Storefront(#[from] StorefrontError),

    /// A cart operation failed.
    #[error("{}", .0.user_message())]
    Cart(#[from] CartError),

    /// Invalid command-line input.
    #[error("{0}")]
    InvalidInput(String),

    /// Reading the password or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Build the storefront from the environment and restore the saved session.
///
/// When a session is restored the cart is fetched as part of startup, the
/// same as in the web UI.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the saved session
/// cannot be read.
pub async fn connect() -> Result<Storefront, CommandError> {
    let config = StorefrontConfig::from_env()?;
    tracing::debug!(api = %config.api_base_url, state_dir = %config.state_dir.display(), "Loaded configuration");

    let api = Arc::new(ApiClient::new(&config.api_base_url));
    let credentials = Arc::new(FileCredentialStore::new(config.session_path()));
    let storefront = Storefront::new(api, credentials);
    storefront.initialize().await?;
    Ok(storefront)
}

/// Use the given password, or read one line from stdin.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub fn password_or_prompt(password: Option<String>) -> Result<String, CommandError> {
    if let Some(password) = password {
        return Ok(password);
    }

    let mut stderr = io::stderr().lock();
    write!(stderr, "Password: ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
