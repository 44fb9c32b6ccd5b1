use fixtures::{
    identity_provider::{s256_challenge, IdentityProvider},
    spawn_in_background,
};
use serde_json::{json, Value};
use std::collections::HashMap;

const REDIRECT_URI: &str = "http://localhost:3000/auth/callback";
const VERIFIER: &str = "dBjftJeZ4CVP-mJ0kXCHz5wOjqTPALfMKmxxiaG1Ox0";

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn query_params(location: &str) -> HashMap<String, String> {
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or_default();
    serde_urlencoded::from_str(query).unwrap()
}

async fn authorize(base: &str, challenge: &str, method: &str) -> HashMap<String, String> {
    let response = no_redirect_client()
        .get(format!("{base}/tenant-id/oauth2/v2.0/authorize"))
        .query(&[
            ("client_id", "client-id"),
            ("response_type", "code"),
            ("redirect_uri", REDIRECT_URI),
            ("response_mode", "query"),
            ("scope", "User.Read"),
            ("code_challenge", challenge),
            ("code_challenge_method", method),
        ])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with(REDIRECT_URI));

    query_params(&location)
}

async fn redeem(base: &str, code: &str, verifier: &str) -> reqwest::Response {
    no_redirect_client()
        .post(format!("{base}/tenant-id/oauth2/v2.0/token"))
        .form(&[
            ("client_id", "client-id"),
            ("scope", "User.Read"),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
            ("client_secret", "client-secret"),
            ("code_verifier", verifier),
        ])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_pkce_flow_returns_profile() {
    let provider = IdentityProvider::with_profile(json!({ "displayName": "Alice" }));
    let base = spawn_in_background(provider.clone().router()).await.unwrap();

    let params = authorize(&base, &s256_challenge(VERIFIER), "S256").await;
    let code = params.get("code").expect("authorize should return a code");

    let response = redeem(&base, code, VERIFIER).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let tokens: Value = response.json().await.unwrap();
    assert_eq!(tokens["token_type"], "Bearer");
    let access_token = tokens["access_token"].as_str().unwrap();

    let profile: Value = no_redirect_client()
        .get(format!("{base}/v1.0/me"))
        .bearer_auth(access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["displayName"], "Alice");
    assert_eq!(provider.token_requests(), 1);
    assert_eq!(provider.profile_requests(), 1);
}

#[tokio::test]
async fn test_wrong_verifier_is_rejected_and_code_is_burned() {
    let base = spawn_in_background(IdentityProvider::new().router())
        .await
        .unwrap();

    let params = authorize(&base, &s256_challenge(VERIFIER), "S256").await;
    let code = params.get("code").unwrap();

    let response = redeem(&base, code, "some-other-verifier-that-is-long-enough-000").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_grant");

    let retry = redeem(&base, code, VERIFIER).await;
    assert_eq!(retry.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plain_challenge_method_is_refused() {
    let base = spawn_in_background(IdentityProvider::new().router())
        .await
        .unwrap();

    let params = authorize(&base, VERIFIER, "plain").await;
    assert_eq!(params.get("error").map(String::as_str), Some("invalid_request"));
    assert!(params.get("code").is_none());
}

#[tokio::test]
async fn test_profile_requires_issued_token() {
    let base = spawn_in_background(IdentityProvider::new().router())
        .await
        .unwrap();

    let response = no_redirect_client()
        .get(format!("{base}/v1.0/me"))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
