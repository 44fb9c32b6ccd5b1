//! Server-side sessions keyed by a signed cookie.
//!
//! The browser only ever holds an opaque session id. The PKCE verifier and the
//! token set live in a [`SessionStore`], which handlers reach through the
//! [`UserSession`] extractor.

use std::{fmt, str::FromStr, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse as _, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::SameSite;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    cookies::{Cookie, CookieJar},
    oauth::OAuthTokenSet,
    state::AppState,
};

mod memory;

pub use memory::MemorySessionStore;

/// Cookie name for storing the session ID
pub const SESSION_COOKIE_NAME: &str = "entra_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Everything we keep about a browser between requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// PKCE verifier of the authorization attempt in flight, if any
    pub code_verifier: Option<String>,
    /// Result of a successful code exchange
    pub token_set: Option<OAuthTokenSet>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session backend failure: {0}")]
    Backend(String),
}

/// Storage for session data.
///
/// Writes are whole-record and last-write-wins: two overlapping requests from
/// the same browser may overwrite each other's changes.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Look up a live session. Expired sessions are reported as `None`.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, SessionError>;

    /// Create or replace a session, extending its lifetime
    async fn save(&self, id: &SessionId, data: SessionData) -> Result<(), SessionError>;

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError>;

    /// Drop every expired session, returning how many were removed
    async fn purge_expired(&self) -> Result<usize, SessionError>;
}

/// The current browser's session.
///
/// Extracting it creates a fresh, empty session (and sets the cookie) when the
/// request carries no valid session cookie.
pub struct UserSession {
    id: SessionId,
    data: SessionData,
    store: Arc<dyn SessionStore>,
    cookies: CookieJar,
    secure: bool,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for UserSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = CookieJar::from_request_parts(parts, state).await?;
        let store = state.sessions.clone();
        let secure = state.config.entra.uses_https();

        if let Some(id) = get_session_id_from_cookie(&cookies) {
            match store.load(&id).await {
                Ok(Some(data)) => {
                    return Ok(UserSession {
                        id,
                        data,
                        store,
                        cookies,
                        secure,
                    });
                }
                Ok(None) => info!("Session {} is unknown or expired, starting a new one", id),
                Err(err) => {
                    error!("Error loading session {}: {:?}", id, err);
                    return Err(Redirect::to("/").into_response());
                }
            }
        }

        let id = SessionId::new();
        let data = SessionData::default();
        if let Err(err) = store.save(&id, data.clone()).await {
            error!("Failed to create session: {:?}", err);
            return Err(Redirect::to("/").into_response());
        }

        cookies.add(create_session_cookie(
            id,
            secure,
            state.config.session_ttl.num_seconds(),
        ));
        info!("Created new session {}", id);

        Ok(UserSession {
            id,
            data,
            store,
            cookies,
            secure,
        })
    }
}

impl UserSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Replace the stored session data
    pub async fn set(&mut self, data: SessionData) -> Result<(), SessionError> {
        self.store.save(&self.id, data.clone()).await?;
        self.data = data;
        Ok(())
    }

    /// Start a new authorization attempt, replacing any verifier still in flight
    pub async fn set_code_verifier(&mut self, verifier: String) -> Result<(), SessionError> {
        let mut data = self.data.clone();
        data.code_verifier = Some(verifier);
        self.set(data).await
    }

    pub async fn set_token_set(&mut self, token_set: OAuthTokenSet) -> Result<(), SessionError> {
        let mut data = self.data.clone();
        data.token_set = Some(token_set);
        self.set(data).await
    }

    /// Throw away everything stored for this session.
    ///
    /// The cookie is removed even when the store fails, so the browser always
    /// starts over with a clean session.
    pub async fn destroy(self) -> Result<(), SessionError> {
        let result = self.store.destroy(&self.id).await;

        let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        self.cookies.remove(cookie);

        if result.is_ok() {
            info!("Session {} destroyed", self.id);
        }

        result
    }
}

/// Get the session ID from the cookie
pub fn get_session_id_from_cookie(cookies: &CookieJar) -> Option<SessionId> {
    cookies
        .get(SESSION_COOKIE_NAME)
        .and_then(|cookie| cookie.value().parse::<SessionId>().ok())
}

/// Creates a session cookie for the given session ID
fn create_session_cookie(id: SessionId, secure: bool, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    // Lax, so the cookie survives the top-level redirect back from the provider
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(time::Duration::seconds(max_age_secs));
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_round_trips_through_cookie_value() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();

        assert_eq!(id, parsed);
    }

    #[test]
    fn test_garbage_session_id_is_rejected() {
        assert!("not-a-session".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = SessionId::new();
        let cookie = create_session_cookie(id, true, 3600);

        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), id.to_string());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(1)));
    }

    #[test]
    fn test_new_session_is_empty() {
        let data = SessionData::default();

        assert!(data.code_verifier.is_none());
        assert!(data.token_set.is_none());
    }
}
