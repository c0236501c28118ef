//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]   # listener and transport settings
//! [yoto]     # OAuth client credentials and upstream endpoints
//! ```

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default bind address for the proxy.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default per-call timeout for upstream requests, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default front-end page the OAuth callback redirects to.
pub const DEFAULT_SETUP_PATH: &str = "/setup/";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Every field is optional so partial layers (user config, project-local
/// config, environment) can be merged on top of each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener settings.
    pub server: ServerSection,
    /// Yoto OAuth client and upstream settings.
    pub yoto: YotoSection,
}

impl ProxyConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: ProxyConfig) {
        self.server.merge(other.server);
        self.yoto.merge(other.yoto);
    }

    /// Copy with secrets replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let redact = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some("********".to_string());
            }
        };
        redact(&mut config.yoto.client_secret);
        redact(&mut config.yoto.refresh_token);
        config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Section
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to, e.g. `0.0.0.0:8000`.
    pub bind: Option<String>,
    /// Browser origins allowed by CORS.
    pub cors_origins: Option<Vec<String>>,
    /// Timeout applied to every upstream call. `0` means the default.
    pub request_timeout_secs: Option<u64>,
    /// Front-end page that receives the OAuth callback's code.
    pub setup_path: Option<String>,
}

impl ServerSection {
    fn merge(&mut self, other: ServerSection) {
        merge_opt(&mut self.bind, other.bind);
        merge_opt(&mut self.cors_origins, other.cors_origins);
        merge_opt(&mut self.request_timeout_secs, other.request_timeout_secs);
        merge_opt(&mut self.setup_path, other.setup_path);
    }

    /// Resolved bind address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let raw = self.bind.as_deref().unwrap_or(DEFAULT_BIND);
        raw.parse()
            .map_err(|_| ConfigError::InvalidBind(raw.to_string()))
    }

    /// Resolved upstream timeout.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Resolved OAuth callback target.
    pub fn setup_path(&self) -> &str {
        self.setup_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SETUP_PATH)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Yoto Section
// ─────────────────────────────────────────────────────────────────────────────

/// `[yoto]` section.
///
/// Endpoint fields left unset fall back to the public Yoto endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YotoSection {
    /// Use the deployment's own client id/secret for every caller.
    pub use_env_credentials: Option<bool>,
    /// Server-side OAuth client id.
    pub client_id: Option<String>,
    /// Server-side OAuth client secret.
    pub client_secret: Option<String>,
    /// Server-side refresh token for the env-authenticated endpoints.
    pub refresh_token: Option<String>,
    /// Root of the resource API.
    pub api_base_url: Option<String>,
    /// OAuth token endpoint.
    pub token_url: Option<String>,
    /// OAuth authorize endpoint.
    pub authorize_url: Option<String>,
    /// Audience sent with every grant.
    pub audience: Option<String>,
    /// Scope requested by the authorize redirect.
    pub scope: Option<String>,
}

impl YotoSection {
    fn merge(&mut self, other: YotoSection) {
        merge_opt(&mut self.use_env_credentials, other.use_env_credentials);
        merge_opt(&mut self.client_id, other.client_id);
        merge_opt(&mut self.client_secret, other.client_secret);
        merge_opt(&mut self.refresh_token, other.refresh_token);
        merge_opt(&mut self.api_base_url, other.api_base_url);
        merge_opt(&mut self.token_url, other.token_url);
        merge_opt(&mut self.authorize_url, other.authorize_url);
        merge_opt(&mut self.audience, other.audience);
        merge_opt(&mut self.scope, other.scope);
    }

    /// Whether server-credential mode is on.
    pub fn use_env_credentials(&self) -> bool {
        self.use_env_credentials.unwrap_or(false)
    }

    /// Whether a secret is stored in plain text in this layer.
    pub fn has_plaintext_secret(&self) -> bool {
        self.client_secret.is_some() || self.refresh_token.is_some()
    }
}

fn merge_opt<T>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}
