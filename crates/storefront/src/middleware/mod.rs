//! HTTP middleware stack for the local UI.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers
//! 4. Same-origin check for state-changing requests

pub mod same_origin;
pub mod security_headers;

pub use same_origin::same_origin_middleware;
pub use security_headers::security_headers_middleware;
