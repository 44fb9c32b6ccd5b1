use std::{sync::Arc, time::Duration};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{config::EntraConfig, pkce::CODE_CHALLENGE_METHOD};

use super::{top_level_fields, truncate_body, OAuthTokenSet, ProviderError};

/// Upper bound for every call we make to the provider
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct AuthUrlParams<'a> {
    client_id: &'a str,
    response_type: &'static str,
    redirect_uri: &'a str,
    response_mode: &'static str,
    scope: &'a str,
    code_challenge: &'a str,
    code_challenge_method: &'static str,
}

#[derive(Serialize)]
struct TokenRequestParams<'a> {
    client_id: &'a str,
    scope: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
    client_secret: &'a str,
    code_verifier: &'a str,
}

/// Talks to the Entra ID authorize/token endpoints and to Microsoft Graph.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct EntraClient {
    http: reqwest::Client,
    config: Arc<EntraConfig>,
}

impl EntraClient {
    pub fn new(config: Arc<EntraConfig>) -> crate::Result<Self> {
        Self::with_timeout(config, PROVIDER_TIMEOUT)
    }

    /// Like [`EntraClient::new`], but giving up on the provider after `timeout`
    pub fn with_timeout(config: Arc<EntraConfig>, timeout: Duration) -> crate::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .use_rustls_tls()
            .build()?;

        Ok(Self { http, config })
    }

    /// The URL the browser is sent to in order to sign in
    pub fn authorize_url(&self, code_challenge: &str) -> crate::Result<String> {
        let query = serde_urlencoded::to_string(AuthUrlParams {
            client_id: &self.config.client_id,
            response_type: "code",
            redirect_uri: &self.config.redirect_uri,
            response_mode: "query",
            scope: &self.config.scope,
            code_challenge,
            code_challenge_method: CODE_CHALLENGE_METHOD,
        })?;

        Ok(format!("{}?{}", self.config.authorize_endpoint(), query))
    }

    /// Redeem an authorization code, proving possession of the PKCE verifier
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuthTokenSet, ProviderError> {
        let endpoint = self.config.token_endpoint();
        debug!("Token endpoint: {}", endpoint);

        let params = TokenRequestParams {
            client_id: &self.config.client_id,
            scope: &self.config.scope,
            code,
            redirect_uri: &self.config.redirect_uri,
            grant_type: "authorization_code",
            client_secret: &self.config.client_secret,
            code_verifier,
        };

        let response = self
            .http
            .post(&endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|source| network_error(&endpoint, source))?;

        read_json(endpoint, response).await
    }

    /// Fetch the signed-in user's profile from Microsoft Graph
    #[tracing::instrument(skip_all)]
    pub async fn fetch_profile(&self, access_token: &str) -> Result<Value, ProviderError> {
        let endpoint = self.config.profile_endpoint();

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| network_error(&endpoint, source))?;

        read_json(endpoint, response).await
    }
}

fn network_error(endpoint: &str, source: reqwest::Error) -> ProviderError {
    let err = ProviderError::Network {
        endpoint: endpoint.to_string(),
        source,
    };
    if err.is_timeout() {
        warn!("{} did not answer in time", endpoint);
    }
    err
}

/// Turn a provider response into `T`, or into the matching [`ProviderError`]
async fn read_json<T: DeserializeOwned>(
    endpoint: String,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(source) => return Err(network_error(&endpoint, source)),
    };

    if !status.is_success() {
        return Err(ProviderError::Status {
            endpoint,
            status,
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| ProviderError::MalformedBody {
        endpoint,
        source,
        fields: top_level_fields(&body),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn test_config() -> Arc<EntraConfig> {
        Arc::new(EntraConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            tenant_id: "tenant-id".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            authority: "https://login.microsoft.com".to_string(),
            scope: "User.Read".to_string(),
            graph_url: "https://graph.microsoft.com".to_string(),
        })
    }

    #[test]
    fn test_authorize_url_has_every_parameter() {
        let client = EntraClient::new(test_config()).unwrap();
        let url = client.authorize_url("the-challenge").unwrap();

        let (base, query) = url.split_once('?').unwrap();
        assert_eq!(
            base,
            "https://login.microsoft.com/tenant-id/oauth2/v2.0/authorize"
        );

        let params: HashMap<String, String> = serde_urlencoded::from_str(query).unwrap();
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/auth/callback");
        assert_eq!(params["response_mode"], "query");
        assert_eq!(params["scope"], "User.Read");
        assert_eq!(params["code_challenge"], "the-challenge");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn test_authorize_url_never_contains_the_secret() {
        let client = EntraClient::new(test_config()).unwrap();
        let url = client.authorize_url("the-challenge").unwrap();

        assert!(!url.contains("client-secret"));
        assert!(!url.contains("client_secret"));
    }

    #[test]
    fn test_authorize_url_encodes_redirect_uri() {
        let client = EntraClient::new(test_config()).unwrap();
        let url = client.authorize_url("abc").unwrap();

        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_a_network_error() {
        let mut config = (*test_config()).clone();
        // Port 9 (discard) on localhost is essentially never listening
        config.authority = "http://127.0.0.1:9".to_string();
        let client = EntraClient::new(Arc::new(config)).unwrap();

        let err = client
            .exchange_code_for_token("code", "verifier")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Network { .. }));
    }

    #[tokio::test]
    async fn test_silent_provider_is_a_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer them
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut config = (*test_config()).clone();
        config.authority = format!("http://{addr}");
        let client = EntraClient::with_timeout(Arc::new(config), Duration::from_millis(100)).unwrap();

        let err = client
            .exchange_code_for_token("code", "verifier")
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "expected a timeout, got {err:?}");
    }

    #[tokio::test]
    async fn test_malformed_success_body_keeps_only_field_names() {
        let body = r#"{"token_type":"Bearer","refresh_token":"refresh-secret","id_token":"id-secret"}"#;
        let response = reqwest::Response::from(
            axum::http::Response::builder()
                .status(200)
                .body(body)
                .unwrap(),
        );

        let err = read_json::<OAuthTokenSet>("https://provider.test/token".to_string(), response)
            .await
            .unwrap_err();

        let logged = format!("{err} {err:?}");
        assert!(!logged.contains("refresh-secret"));
        assert!(!logged.contains("id-secret"));
        assert!(logged.contains("refresh_token"));
        assert!(logged.contains("access_token"));
        match err {
            ProviderError::MalformedBody { fields, .. } => {
                assert_eq!(fields, vec!["id_token", "refresh_token", "token_type"]);
            }
            other => panic!("expected a malformed body error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_body_is_kept_for_diagnosis() {
        let response = reqwest::Response::from(
            axum::http::Response::builder()
                .status(400)
                .body(r#"{"error":"invalid_grant"}"#)
                .unwrap(),
        );

        let err = read_json::<OAuthTokenSet>("https://provider.test/token".to_string(), response)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid_grant"));
    }
}
