use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse as _, Response},
};
use sha2::{Digest, Sha512};
use tracing::error;

pub use tower_cookies::{Cookie, Key};

use crate::state::AppState;

/// Derive the cookie signing key from the configured `SECRET`.
///
/// `Key` wants exactly 64 bytes of key material, which is what SHA-512 produces.
pub fn signing_key_from_secret(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Cookie access for handlers. Every cookie is signed with the app's key, so
/// values handed back by the browser are only trusted if the signature holds.
pub struct CookieJar {
    cookies: tower_cookies::Cookies,
    key: Key,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CookieJar {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = match tower_cookies::Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err(_) => {
                error!("Failed to extract cookies from request");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        Ok(CookieJar {
            cookies,
            key: state.cookie_key.clone(),
        })
    }
}

impl CookieJar {
    /// Add a new signed cookie
    pub fn add(&self, cookie: Cookie<'static>) {
        self.cookies.signed(&self.key).add(cookie);
    }

    /// Get a signed cookie by name. Cookies with a bad signature are treated as absent.
    pub fn get(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies.signed(&self.key).get(name)
    }

    /// Removes the `cookie` from the jar.
    pub fn remove(&self, cookie: Cookie<'static>) {
        self.cookies.signed(&self.key).remove(cookie);
    }
}
