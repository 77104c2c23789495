//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ATELIER_API_BASE_URL` - Remote REST API base URL
//!   (default: <https://e-com-kjm6.onrender.com/api>)
//! - `ATELIER_STATE_DIR` - Directory holding the persisted session
//!   (default: `<platform data dir>/atelier`)
//! - `ATELIER_THEME` - UI palette, `amber` or `rose` (default: amber)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::components::Theme;

/// Default remote API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://e-com-kjm6.onrender.com/api";

/// File name of the persisted session inside the state directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote REST API base URL (no trailing slash)
    pub api_base_url: Url,
    /// Directory holding the persisted session file
    pub state_dir: PathBuf,
    /// UI palette
    pub theme: Theme,
    /// IP address to bind the local web UI to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "development")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value, or
    /// if no state directory is configured and the platform has none.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_api_base_url(&get_env_or_default(
            "ATELIER_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))?;
        let state_dir = match get_optional_env("ATELIER_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_state_dir()?,
        };
        let theme = get_env_or_default("ATELIER_THEME", "amber")
            .parse::<Theme>()
            .map_err(|e| ConfigError::InvalidEnvVar("ATELIER_THEME".to_string(), e))?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_base_url,
            state_dir,
            theme,
            host,
            port,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the local web UI.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the web UI is reachable from other machines.
    ///
    /// The UI acts with the signed-in shopper's token and has no login of its
    /// own, so anything but a loopback bind exposes that session.
    #[must_use]
    pub const fn is_exposed(&self) -> bool {
        !self.host.is_loopback()
    }

    /// Path of the persisted session file.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join(SESSION_FILE_NAME)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalize the API base URL (http/https only, no trailing slash).
fn parse_api_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("ATELIER_API_BASE_URL".to_string(), msg);

    let url = Url::parse(raw.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme: {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL must have a host".to_string()));
    }
    Ok(url)
}

/// Platform data directory for Atelier (e.g. `~/.local/share/atelier`).
fn default_state_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("atelier"))
        .ok_or_else(|| ConfigError::MissingEnvVar("ATELIER_STATE_DIR".to_string()))
}

/// Get a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}
