use std::sync::Arc;

use facility_core::persist::KeyValueStore;
use validator::ValidateUrl;

use crate::error::GatewayError;

/// Session store key holding the backend host.
pub const BASE_URL_KEY: &str = "base_url";

/// Session store key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Transport settings for the gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `REQUEST_TIMEOUT_SECS` | `30`    |
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                GatewayError::Configuration(format!(
                    "REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => Self::default().request_timeout_secs,
        };
        Ok(Self {
            request_timeout_secs,
        })
    }
}

/// Backend host and bearer token for the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    base_url: String,
    token: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SessionConfig {
    /// Build a session from raw values. The host is normalised with
    /// [`normalize_base_url`]; a blank token is a configuration error.
    pub fn new(base_url: &str, token: &str) -> Result<Self, GatewayError> {
        let base_url = normalize_base_url(base_url)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(GatewayError::Configuration(
                "Authentication token is not configured".into(),
            ));
        }
        Ok(Self {
            base_url,
            token: token.to_string(),
        })
    }

    /// Read the session from the durable store (`base_url`, `token` keys).
    pub fn from_store(store: &dyn KeyValueStore) -> Result<Self, GatewayError> {
        let base_url = store.get(BASE_URL_KEY)?.unwrap_or_default();
        let token = store.get(TOKEN_KEY)?.unwrap_or_default();
        Self::new(&base_url, &token)
    }

    /// Read the session from the environment.
    ///
    /// | Env Var             | Default  |
    /// |---------------------|----------|
    /// | `FACILITY_BASE_URL` | required |
    /// | `FACILITY_TOKEN`    | required |
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_url = std::env::var("FACILITY_BASE_URL").unwrap_or_default();
        let token = std::env::var("FACILITY_TOKEN").unwrap_or_default();
        Self::new(&base_url, &token)
    }

    /// Write this session into the durable store.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), GatewayError> {
        store.set(BASE_URL_KEY, &self.base_url)?;
        store.set(TOKEN_KEY, &self.token)?;
        Ok(())
    }

    /// Normalised base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Where the client reads its session from.
///
/// `Store` is read on every request so a sign-in or host change takes effect
/// without rebuilding the client.
#[derive(Clone)]
pub enum SessionSource {
    Store(Arc<dyn KeyValueStore>),
    Fixed(SessionConfig),
}

impl SessionSource {
    pub fn resolve(&self) -> Result<SessionConfig, GatewayError> {
        match self {
            Self::Store(store) => SessionConfig::from_store(store.as_ref()),
            Self::Fixed(session) => Ok(session.clone()),
        }
    }
}

/// Normalise a backend host.
///
/// Surrounding whitespace and trailing slashes are removed and `https://` is
/// prepended when no scheme is given. The result must be a valid URL.
pub fn normalize_base_url(raw: &str) -> Result<String, GatewayError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(GatewayError::Configuration(
            "Base URL is not configured".into(),
        ));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    if !candidate.validate_url() {
        return Err(GatewayError::Configuration(format!(
            "Base URL '{raw}' is not a valid URL"
        )));
    }
    Ok(candidate)
}
