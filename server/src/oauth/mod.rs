//! OAuth module for the Microsoft Entra ID authorization code flow.
//! This includes building the authorize URL, redeeming codes at the token
//! endpoint and calling Microsoft Graph with the resulting access token.

pub mod client;
pub mod token;

pub use client::*;
pub use token::OAuthTokenSet;

/// Longest provider response body we will copy into a log line
pub const MAX_LOGGED_BODY_CHARS: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Connection failures, timeouts, and bodies that could not be read
    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with {status}: {body}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
        /// Response body, truncated to [`MAX_LOGGED_BODY_CHARS`]
        body: String,
    },

    /// A success response we could not parse. Only the top-level field names
    /// are kept, since a token response can carry credentials.
    #[error("{endpoint} returned a body we could not understand: {source} (fields: {fields:?})")]
    MalformedBody {
        endpoint: String,
        #[source]
        source: serde_json::Error,
        fields: Vec<String>,
    },
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Network { source, .. } if source.is_timeout())
    }
}

/// Names of the top-level fields of a JSON object body, without their values
pub fn top_level_fields(body: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => {
            let mut fields: Vec<String> = map.keys().cloned().collect();
            fields.sort();
            fields
        }
        _ => Vec::new(),
    }
}

/// Shorten a response body so it can be logged without flooding the output
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY_CHARS {
        return body.to_string();
    }

    let mut truncated: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_bodies_are_untouched() {
        assert_eq!(truncate_body("{\"error\":\"invalid_grant\"}"), "{\"error\":\"invalid_grant\"}");
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(MAX_LOGGED_BODY_CHARS * 3);
        let truncated = truncate_body(&body);

        assert_eq!(truncated.len(), MAX_LOGGED_BODY_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let body = "é".repeat(MAX_LOGGED_BODY_CHARS + 10);
        let truncated = truncate_body(&body);

        assert_eq!(truncated.chars().count(), MAX_LOGGED_BODY_CHARS + 3);
    }

    #[test]
    fn test_status_error_reports_status() {
        let err = ProviderError::Status {
            endpoint: "https://login.microsoft.com/t/oauth2/v2.0/token".to_string(),
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "{}".to_string(),
        };

        assert!(!err.is_timeout());
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_top_level_fields_drop_values() {
        let fields = top_level_fields(r#"{"refresh_token":"secret-value","expires_in":3599}"#);

        assert_eq!(fields, vec!["expires_in".to_string(), "refresh_token".to_string()]);
    }

    #[test]
    fn test_top_level_fields_of_non_objects_are_empty() {
        assert!(top_level_fields("<html>oops</html>").is_empty());
        assert!(top_level_fields("[1, 2]").is_empty());
    }
}
