//! An in-memory identity provider with the Microsoft Entra ID endpoint layout.
//!
//! The authorize endpoint skips the login UI and immediately sends the browser
//! back to the client with a fresh authorization code. The token endpoint
//! checks PKCE (S256 only) before minting tokens, and `/v1.0/me` answers like
//! Microsoft Graph for any access token this provider issued.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Lifetime reported in the `expires_in` field of minted tokens
pub const TOKEN_LIFETIME_SECS: u64 = 3599;

/// An authorization code waiting to be redeemed at the token endpoint
#[derive(Debug, Clone)]
struct PendingGrant {
    client_id: String,
    redirect_uri: String,
    code_challenge: String,
    scope: String,
}

#[derive(Clone)]
pub struct IdentityProvider {
    grants: Arc<Mutex<HashMap<String, PendingGrant>>>,
    access_tokens: Arc<Mutex<HashSet<String>>>,
    profile: Arc<Value>,
    token_requests: Arc<AtomicUsize>,
    profile_requests: Arc<AtomicUsize>,
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::with_profile(default_profile())
    }
}

impl IdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `profile` from `/v1.0/me` instead of the built-in fixture user
    pub fn with_profile(profile: Value) -> Self {
        Self {
            grants: Arc::default(),
            access_tokens: Arc::default(),
            profile: Arc::new(profile),
            token_requests: Arc::default(),
            profile_requests: Arc::default(),
        }
    }

    /// Number of requests the token endpoint has received
    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    /// Number of requests the profile endpoint has received
    pub fn profile_requests(&self) -> usize {
        self.profile_requests.load(Ordering::SeqCst)
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/:tenant/oauth2/v2.0/authorize", get(authorize))
            .route("/:tenant/oauth2/v2.0/token", post(token))
            .route("/v1.0/me", get(me))
            .with_state(self)
    }
}

/// The profile served when no other profile was configured
pub fn default_profile() -> Value {
    json!({
        "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users/$entity",
        "id": "00000000-0000-0000-0000-000000000001",
        "displayName": "Fixture User",
        "givenName": "Fixture",
        "surname": "User",
        "mail": "fixture.user@example.com",
        "userPrincipalName": "fixture.user@example.com",
        "jobTitle": null,
        "preferredLanguage": "en-US"
    })
}

/// `BASE64URL(SHA256(verifier))`, the only challenge method this provider accepts
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[derive(Debug, Deserialize)]
struct AuthorizeParams {
    client_id: String,
    response_type: String,
    redirect_uri: String,
    response_mode: Option<String>,
    scope: Option<String>,
    code_challenge: Option<String>,
    code_challenge_method: Option<String>,
    state: Option<String>,
}

#[derive(Serialize)]
struct OAuthRedirectParams<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

#[derive(Serialize)]
struct OAuthErrorRedirectParams<'a> {
    error: &'a str,
    error_description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

fn redirect_with<T: Serialize>(redirect_uri: &str, params: &T) -> Response {
    let query = match serde_urlencoded::to_string(params) {
        Ok(query) => query,
        Err(err) => {
            warn!("Failed to encode redirect parameters: {:?}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let separator = if redirect_uri.contains('?') { '&' } else { '?' };

    Redirect::to(&format!("{redirect_uri}{separator}{query}")).into_response()
}

async fn authorize(
    State(provider): State<IdentityProvider>,
    Path(tenant): Path<String>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    info!(
        "IdP: authorize request for tenant {} from client {}",
        tenant, params.client_id
    );

    let problem = if params.response_type != "code" {
        Some("response_type must be 'code'")
    } else if params.response_mode.as_deref().is_some_and(|mode| mode != "query") {
        Some("only response_mode=query is supported")
    } else if params.code_challenge_method.as_deref() != Some("S256") {
        Some("code_challenge_method must be S256")
    } else if params.code_challenge.as_deref().unwrap_or_default().is_empty() {
        Some("code_challenge is required")
    } else {
        None
    };

    if let Some(description) = problem {
        warn!("IdP: rejecting authorize request: {}", description);
        return redirect_with(
            &params.redirect_uri,
            &OAuthErrorRedirectParams {
                error: "invalid_request",
                error_description: description,
                state: params.state.as_deref(),
            },
        );
    }

    let code = format!("fixture-code-{}", Uuid::new_v4());
    provider.grants.lock().await.insert(
        code.clone(),
        PendingGrant {
            client_id: params.client_id,
            redirect_uri: params.redirect_uri.clone(),
            code_challenge: params.code_challenge.unwrap_or_default(),
            scope: params.scope.unwrap_or_default(),
        },
    );

    redirect_with(
        &params.redirect_uri,
        &OAuthRedirectParams {
            code: &code,
            state: params.state.as_deref(),
        },
    )
}

#[derive(Debug, Deserialize)]
struct TokenParams {
    grant_type: String,
    code: Option<String>,
    redirect_uri: Option<String>,
    client_id: String,
    #[allow(dead_code)]
    client_secret: Option<String>,
    code_verifier: Option<String>,
    scope: Option<String>,
}

fn invalid_grant(description: &str) -> Response {
    warn!("IdP: token request rejected: {}", description);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_grant",
            "error_description": description,
        })),
    )
        .into_response()
}

async fn token(
    State(provider): State<IdentityProvider>,
    Path(tenant): Path<String>,
    Form(params): Form<TokenParams>,
) -> Response {
    provider.token_requests.fetch_add(1, Ordering::SeqCst);
    info!(
        "IdP: token request for tenant {} from client {}",
        tenant, params.client_id
    );

    if params.grant_type != "authorization_code" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response();
    }

    let Some(code) = params.code.as_deref() else {
        return invalid_grant("code is required");
    };

    // Codes are single use, even when redemption fails
    let Some(grant) = provider.grants.lock().await.remove(code) else {
        return invalid_grant("authorization code is unknown or already redeemed");
    };

    if grant.client_id != params.client_id {
        return invalid_grant("code was issued to a different client");
    }

    if params.redirect_uri.as_deref() != Some(grant.redirect_uri.as_str()) {
        return invalid_grant("redirect_uri does not match the authorize request");
    }

    let Some(verifier) = params.code_verifier.as_deref() else {
        return invalid_grant("code_verifier is required");
    };

    if s256_challenge(verifier) != grant.code_challenge {
        return invalid_grant("code_verifier does not match the code_challenge");
    }

    let access_token = format!("fixture-access-{}", Uuid::new_v4());
    provider
        .access_tokens
        .lock()
        .await
        .insert(access_token.clone());

    let scope = params.scope.unwrap_or(grant.scope);

    Json(json!({
        "token_type": "Bearer",
        "scope": scope,
        "expires_in": TOKEN_LIFETIME_SECS,
        "ext_expires_in": TOKEN_LIFETIME_SECS,
        "access_token": access_token,
        "refresh_token": format!("fixture-refresh-{}", Uuid::new_v4()),
    }))
    .into_response()
}

async fn me(State(provider): State<IdentityProvider>, headers: HeaderMap) -> Response {
    provider.profile_requests.fetch_add(1, Ordering::SeqCst);

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let authorized = match bearer {
        Some(token) => provider.access_tokens.lock().await.contains(token),
        None => false,
    };

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": {
                    "code": "InvalidAuthenticationToken",
                    "message": "Access token is empty or invalid.",
                }
            })),
        )
            .into_response();
    }

    Json(provider.profile.as_ref().clone()).into_response()
}
