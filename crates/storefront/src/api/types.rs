//! Request and response bodies for the remote API.

use atelier_core::{ProductId, Role};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Username and password submitted to `/login` or `/register`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from plain strings.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Successful `/login` response.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Bearer token for authenticated endpoints.
    pub access_token: SecretString,
    /// Role granted to the account.
    pub role: Role,
}

/// Generic acknowledgement (`{"message": "..."}`).
///
/// Empty or non-JSON success bodies are accepted as an acknowledgement
/// without a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful `POST /products` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedProduct {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
}

// =============================================================================
// Wire Types
// =============================================================================

/// Body of `/login` and `/register`.
#[derive(Debug, Serialize)]
pub(crate) struct CredentialsBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Raw `/login` response; the token is wrapped in a secret right after parsing.
#[derive(Deserialize)]
pub(crate) struct LoginBody {
    pub access_token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body of `POST /cart/add`.
#[derive(Debug, Serialize)]
pub(crate) struct AddToCartBody<'a> {
    pub product_id: &'a ProductId,
}

/// Error body returned with 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

/// Extract the server-supplied error text from a failure body, if any.
pub(crate) fn server_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_message_prefers_error_field() {
        assert_eq!(
            server_error_message(r#"{"error": "User already exists"}"#).as_deref(),
            Some("User already exists")
        );
    }

    #[test]
    fn test_server_error_message_ignores_missing_or_blank() {
        assert_eq!(server_error_message(""), None);
        assert_eq!(server_error_message("<html>502</html>"), None);
        assert_eq!(server_error_message(r#"{"message": "nope"}"#), None);
        assert_eq!(server_error_message(r#"{"error": "  "}"#), None);
    }

    #[test]
    fn test_register_body_carries_user_role() {
        let body = CredentialsBody {
            username: "alice",
            password: "x",
            role: Some(Role::User),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"username": "alice", "password": "x", "role": "user"})
        );
    }

    #[test]
    fn test_login_response_accepts_any_role_text() {
        for raw in [
            r#"{"access_token": "T", "role": "manager"}"#,
            r#"{"access_token": "T", "role": null}"#,
            r#"{"access_token": "T"}"#,
        ] {
            let login: LoginBody = serde_json::from_str(raw).unwrap();
            assert_eq!(login.access_token.as_deref(), Some("T"));
            assert!(login.role.as_deref() != Some("admin"));
        }
    }

    #[test]
    fn test_login_body_omits_role() {
        let body = CredentialsBody {
            username: "alice",
            password: "x",
            role: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("role").is_none());
    }

    #[test]
    fn test_created_product_parses_id() {
        let created: CreatedProduct = serde_json::from_str(
            r#"{"message": "Product added successfully", "product_id": "65f1"}"#,
        )
        .unwrap();
        assert_eq!(created.product_id, Some(ProductId::new("65f1")));
    }
}
