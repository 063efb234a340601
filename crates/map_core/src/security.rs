//! Applying credentials from the opaque security bag to a request.
//!
//! The bag is keyed by scheme id:
//!
//! ```json
//! { "api_key": { "apikey": "..." },
//!   "bearer_token": { "token": "..." },
//!   "basic": { "username": "...", "password": "..." } }
//! ```

use crate::outcome::{ErrorDetail, Outcome};
use crate::types::RequestDescriptor;
use base64::Engine;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyPlacement {
    Header,
    Query,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityScheme {
    ApiKey {
        id: String,
        placement: ApiKeyPlacement,
        name: String,
    },
    Bearer {
        id: String,
    },
    Basic {
        id: String,
    },
}

impl SecurityScheme {
    pub fn api_key(id: impl Into<String>, placement: ApiKeyPlacement, name: impl Into<String>) -> Self {
        SecurityScheme::ApiKey {
            id: id.into(),
            placement,
            name: name.into(),
        }
    }

    pub fn bearer(id: impl Into<String>) -> Self {
        SecurityScheme::Bearer { id: id.into() }
    }

    pub fn basic(id: impl Into<String>) -> Self {
        SecurityScheme::Basic { id: id.into() }
    }

    pub fn id(&self) -> &str {
        match self {
            SecurityScheme::ApiKey { id, .. }
            | SecurityScheme::Bearer { id }
            | SecurityScheme::Basic { id } => id,
        }
    }

    /// Returns `request` carrying the credentials of this scheme, or a
    /// "Missing credentials" error naming the absent value.
    pub fn apply(&self, request: RequestDescriptor, security: &Value) -> Outcome<RequestDescriptor> {
        let values = security.get(self.id());
        let credential = |field: &str| -> Outcome<String> {
            values
                .and_then(|v| v.get(field))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    ErrorDetail::new("Missing credentials").with_detail(format!("{}.{field}", self.id()))
                })
        };

        match self {
            SecurityScheme::ApiKey {
                placement, name, ..
            } => {
                let key = credential("apikey")?;
                Ok(match placement {
                    ApiKeyPlacement::Header => request.header(name, key),
                    ApiKeyPlacement::Query => request.query(name.as_str(), key),
                })
            }
            SecurityScheme::Bearer { .. } => {
                let token = credential("token")?;
                Ok(request.header("authorization", format!("Bearer {token}")))
            }
            SecurityScheme::Basic { .. } => {
                let user = credential("username")?;
                let pass = credential("password")?;
                let encoded =
                    base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
                Ok(request.header("authorization", format!("Basic {encoded}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_key_in_query() {
        let scheme = SecurityScheme::api_key("api_key", ApiKeyPlacement::Query, "key");
        let req = scheme
            .apply(RequestDescriptor::get("https://x"), &json!({"api_key": {"apikey": "k1"}}))
            .unwrap();
        assert_eq!(req.query, vec![("key".to_string(), "k1".to_string())]);
    }

    #[test]
    fn api_key_in_header() {
        let scheme = SecurityScheme::api_key("api_key", ApiKeyPlacement::Header, "X-Api-Key");
        let req = scheme
            .apply(RequestDescriptor::get("https://x"), &json!({"api_key": {"apikey": "k1"}}))
            .unwrap();
        assert_eq!(req.headers.get("x-api-key"), Some("k1"));
    }

    #[test]
    fn bearer_sets_authorization() {
        let scheme = SecurityScheme::bearer("bearer_token");
        let req = scheme
            .apply(RequestDescriptor::get("https://x"), &json!({"bearer_token": {"token": "t"}}))
            .unwrap();
        assert_eq!(req.headers.get("authorization"), Some("Bearer t"));
    }

    #[test]
    fn basic_encodes_user_and_password() {
        let scheme = SecurityScheme::basic("basic");
        let req = scheme
            .apply(
                RequestDescriptor::get("https://x"),
                &json!({"basic": {"username": "Aladdin", "password": "open sesame"}}),
            )
            .unwrap();
        assert_eq!(
            req.headers.get("authorization"),
            Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
    }

    #[test]
    fn missing_value_is_domain_error() {
        let scheme = SecurityScheme::basic("basic");
        let err = scheme
            .apply(RequestDescriptor::get("https://x"), &json!({"basic": {"username": "u"}}))
            .unwrap_err();
        assert_eq!(err.title, "Missing credentials");
        assert_eq!(err.detail.as_deref(), Some("basic.password"));
    }
}
