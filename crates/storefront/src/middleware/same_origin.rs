//! Cross-site form submission guard.
//!
//! The UI is unauthenticated at the HTTP level: whoever can reach the port
//! acts as the signed-in shopper. State-changing requests are therefore
//! refused when the browser reports they came from another site.

use axum::{
    extract::Request,
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Reject non-GET requests that a browser marks as cross-site.
///
/// Uses `Sec-Fetch-Site` when present, otherwise compares the `Origin` host
/// with `Host`. Requests carrying neither header (CLI tools, tests) pass.
pub async fn same_origin_middleware(request: Request, next: Next) -> Response {
    let safe_method = matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS);

    if !safe_method && is_cross_site(request.headers()) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected cross-site request"
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(request).await
}

fn is_cross_site(headers: &HeaderMap) -> bool {
    if let Some(site) = headers.get("sec-fetch-site").and_then(|v| v.to_str().ok()) {
        return !matches!(site, "same-origin" | "none");
    }

    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    match (origin, host) {
        (Some("null"), _) => true,
        (Some(origin), Some(host)) => url::Url::parse(origin)
            .ok()
            .and_then(|url| {
                let origin_host = url.host_str()?.to_owned();
                Some(match url.port() {
                    Some(port) => format!("{origin_host}:{port}"),
                    None => origin_host,
                })
            })
            .is_none_or(|origin_host| origin_host != host),
        _ => false,
    }
}
