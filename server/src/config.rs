use std::fmt;

use color_eyre::eyre::{eyre, WrapErr as _};

/// Default authority for Microsoft Entra ID
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoft.com";

/// Default Microsoft Graph base URL used for the profile lookup
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com";

pub const DEFAULT_SCOPE: &str = "User.Read";

pub const DEFAULT_PORT: u16 = 3000;

/// Default session duration in hours
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Longest session we allow, one year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// The cookie signing key is derived from `SECRET`, so it must carry a reasonable amount of entropy
pub const MIN_SECRET_LEN: usize = 32;

/// Everything the Entra ID client needs to talk to the provider.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct EntraConfig {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub redirect_uri: String,
    pub authority: String,
    pub scope: String,
    pub graph_url: String,
}

impl fmt::Debug for EntraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntraConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("tenant_id", &self.tenant_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("authority", &self.authority)
            .field("scope", &self.scope)
            .field("graph_url", &self.graph_url)
            .finish()
    }
}

impl EntraConfig {
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/authorize", self.authority, self.tenant_id)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id)
    }

    pub fn profile_endpoint(&self) -> String {
        format!("{}/v1.0/me", self.graph_url)
    }

    /// Cookies are only marked `Secure` when we are served over https
    pub fn uses_https(&self) -> bool {
        self.redirect_uri.starts_with("https://")
    }
}

/// Process-wide configuration, read from the environment once at startup
#[derive(Clone)]
pub struct Config {
    pub entra: EntraConfig,
    pub secret: String,
    pub port: u16,
    pub session_ttl: chrono::Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("entra", &self.entra)
            .field("secret", &"[redacted]")
            .field("port", &self.port)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// Missing required values fail here rather than at the first request that needs them.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let required = |name: &str| -> crate::Result<String> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(eyre!("{} environment variable not set", name)),
            }
        };
        let optional = |name: &str, default: &str| -> String {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let entra = EntraConfig {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET_VALUE")?,
            tenant_id: required("TENANT_ID")?,
            redirect_uri: required("REDIRECT_URI")?,
            authority: optional("AUTHORITY", DEFAULT_AUTHORITY)
                .trim_end_matches('/')
                .to_string(),
            scope: optional("SCOPE", DEFAULT_SCOPE),
            graph_url: optional("GRAPH_URL", DEFAULT_GRAPH_URL)
                .trim_end_matches('/')
                .to_string(),
        };

        let secret = required("SECRET")?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(eyre!(
                "SECRET must be at least {} bytes long, got {}",
                MIN_SECRET_LEN,
                secret.len()
            ));
        }

        let port = optional("PORT", &DEFAULT_PORT.to_string())
            .parse::<u16>()
            .wrap_err("PORT must be a valid port number")?;

        let ttl_hours = optional("SESSION_TTL_HOURS", &DEFAULT_SESSION_TTL_HOURS.to_string())
            .parse::<i64>()
            .wrap_err("SESSION_TTL_HOURS must be a whole number of hours")?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl_hours) {
            return Err(eyre!(
                "SESSION_TTL_HOURS must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS,
                ttl_hours
            ));
        }

        Ok(Self {
            entra,
            secret,
            port,
            session_ttl: chrono::Duration::hours(ttl_hours),
        })
    }
}
