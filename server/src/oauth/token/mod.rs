use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The complete body of a successful token response.
///
/// Only `access_token` is interpreted. Everything else the provider sends
/// (`token_type`, `expires_in`, `refresh_token`, `id_token`, ...) is kept
/// verbatim so the stored token set is the whole response.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokenSet {
    /// The bearer credential for resource requests
    pub access_token: String,
    /// Every other field of the response, untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OAuthTokenSet {
    /// The token type the provider reported, usually "Bearer"
    pub fn token_type(&self) -> Option<&str> {
        self.extra.get("token_type").and_then(Value::as_str)
    }

    /// Access token lifetime in seconds, when the provider reported one
    pub fn expires_in(&self) -> Option<u64> {
        match self.extra.get("expires_in")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.extra
            .get("refresh_token")
            .and_then(Value::as_str)
            .is_some_and(|token| !token.is_empty())
    }
}

// Tokens never end up in logs
impl fmt::Debug for OAuthTokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenSet")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type())
            .field("expires_in", &self.expires_in())
            .field("has_refresh_token", &self.has_refresh_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_whole_response_is_preserved() {
        let body = json!({
            "token_type": "Bearer",
            "scope": "User.Read profile openid email",
            "expires_in": 4398,
            "ext_expires_in": 4398,
            "access_token": "eyJ0eXAi",
            "refresh_token": "AwABAAAA",
        });

        let token_set: OAuthTokenSet = serde_json::from_value(body.clone()).unwrap();

        assert_eq!(token_set.access_token, "eyJ0eXAi");
        assert_eq!(token_set.token_type(), Some("Bearer"));
        assert_eq!(token_set.expires_in(), Some(4398));
        assert!(token_set.has_refresh_token());
        assert_eq!(serde_json::to_value(&token_set).unwrap(), body);
    }

    #[test]
    fn test_minimal_response() {
        let token_set: OAuthTokenSet =
            serde_json::from_value(json!({ "access_token": "abc" })).unwrap();

        assert_eq!(token_set.access_token, "abc");
        assert_eq!(token_set.token_type(), None);
        assert_eq!(token_set.expires_in(), None);
        assert!(!token_set.has_refresh_token());
    }

    #[test]
    fn test_missing_access_token_is_rejected() {
        let result = serde_json::from_value::<OAuthTokenSet>(json!({
            "error": "invalid_grant",
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_string_expires_in_is_understood() {
        let token_set: OAuthTokenSet =
            serde_json::from_value(json!({ "access_token": "abc", "expires_in": "3600" }))
                .unwrap();

        assert_eq!(token_set.expires_in(), Some(3600));
    }

    #[test]
    fn test_debug_redacts_access_token() {
        let token_set: OAuthTokenSet = serde_json::from_value(json!({
            "access_token": "super-secret-token",
            "refresh_token": "another-secret",
        }))
        .unwrap();

        let debug = format!("{:?}", token_set);
        assert!(!debug.contains("super-secret-token"));
        assert!(!debug.contains("another-secret"));
    }
}
