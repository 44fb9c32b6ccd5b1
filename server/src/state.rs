use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    cookies::{signing_key_from_secret, Key},
    oauth::{EntraClient, PROVIDER_TIMEOUT},
    session::{MemorySessionStore, SessionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cookie_key: Key,
    pub entra: EntraClient,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn from_env() -> crate::Result<Self> {
        let config = Config::from_env()?;
        tracing::info!(
            authority = %config.entra.authority,
            tenant = %config.entra.tenant_id,
            redirect_uri = %config.entra.redirect_uri,
            "Loaded configuration"
        );

        let sessions = Arc::new(MemorySessionStore::new(config.session_ttl));

        Self::new(config, sessions)
    }

    /// Wire up the state around an already-loaded config and session backend
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>) -> crate::Result<Self> {
        Self::with_provider_timeout(config, sessions, PROVIDER_TIMEOUT)
    }

    pub fn with_provider_timeout(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        provider_timeout: Duration,
    ) -> crate::Result<Self> {
        let cookie_key = signing_key_from_secret(&config.secret);
        let entra = EntraClient::with_timeout(Arc::new(config.entra.clone()), provider_timeout)?;

        Ok(Self {
            config: Arc::new(config),
            cookie_key,
            entra,
            sessions,
        })
    }
}
