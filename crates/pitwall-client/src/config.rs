//! Session configuration.

use std::fmt;

use pitwall_core::{ConnectionConfig, SessionRole, StoreConfig};

/// Environment variable overriding the REST base URL.
pub const ENV_API_URL: &str = "PITWALL_API_URL";

/// Environment variable overriding the realtime upgrade endpoint.
pub const ENV_WS_URL: &str = "PITWALL_WS_URL";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_WS_URL: &str = "ws://localhost:8080/api/ws";

/// Opaque bearer credential.
///
/// The token travels in connection-establishment and request headers only,
/// never in query strings or message bodies, and its `Debug` output is
/// redacted so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw secret, for building auth headers.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// Everything a [`crate::Session`] needs to start.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// REST base URL.
    pub api_url: String,
    /// Realtime upgrade endpoint.
    pub ws_url: String,
    /// Bearer credential. `None` means an unauthenticated shell: hooks read
    /// zero/empty state and no HTTP call or connection attempt is made.
    pub auth_token: Option<AuthToken>,
    /// Authenticated user id, used to recognize echoes of this session's own
    /// actions.
    pub user_id: Option<String>,
    /// Session role; staff roles additionally subscribe the broadcast topic.
    pub role: SessionRole,
    /// Transport timing.
    pub connection: ConnectionConfig,
    /// Store tuning.
    pub store: StoreConfig,
}

impl SessionConfig {
    /// Configuration with local-dev defaults and no credential.
    pub fn new(role: SessionRole) -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            auth_token: None,
            user_id: None,
            role,
            connection: ConnectionConfig::default(),
            store: StoreConfig::default(),
        }
    }

    /// Configuration from the environment, falling back to the local-dev
    /// defaults when the variables are unset.
    pub fn from_env(role: SessionRole) -> Self {
        let mut config = Self::new(role);
        if let Ok(url) = std::env::var(ENV_API_URL) {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var(ENV_WS_URL) {
            config.ws_url = url;
        }
        config
    }

    /// Attach the authenticated principal.
    #[must_use]
    pub fn with_auth(mut self, token: AuthToken, user_id: impl Into<String>) -> Self {
        self.auth_token = Some(token);
        self.user_id = Some(user_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let token = AuthToken::new("very-secret");
        assert_eq!(format!("{token:?}"), "AuthToken(..)");
    }

    #[test]
    fn defaults_point_at_local_dev() {
        let config = SessionConfig::new(SessionRole::Customer);
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.ws_url, "ws://localhost:8080/api/ws");
        assert!(config.auth_token.is_none());
    }
}
