//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use yoto_config::ProxyConfig;
use yoto_oauth::{DEFAULT_REQUEST_TIMEOUT, OAuthConfig, ServerCredentials};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// CORS allowed origins (empty = no CORS).
    pub cors_origins: Vec<String>,

    /// Timeout applied to every upstream call.
    pub request_timeout: Duration,

    /// Front-end page the OAuth callback redirects to in server-credential mode.
    pub setup_path: String,

    /// Identity provider endpoints.
    pub oauth: OAuthConfig,

    /// Deployment credentials and the server-credential mode flag.
    pub credentials: ServerCredentials,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origins: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            setup_path: yoto_config::DEFAULT_SETUP_PATH.to_string(),
            oauth: OAuthConfig::default(),
            credentials: ServerCredentials::default(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded configuration, filling unset endpoints with Yoto defaults.
    pub fn from_proxy_config(config: &ProxyConfig) -> yoto_config::Result<Self> {
        let yoto = &config.yoto;

        let mut oauth = OAuthConfig::yoto();
        if let Some(url) = &yoto.token_url {
            oauth = oauth.with_token_url(url.clone());
        }
        if let Some(url) = &yoto.authorize_url {
            oauth = oauth.with_authorize_url(url.clone());
        }
        if let Some(audience) = &yoto.audience {
            oauth = oauth.with_audience(audience.clone());
        }
        if let Some(scope) = &yoto.scope {
            oauth = oauth.with_scope(scope.clone());
        }

        Ok(Self {
            bind_address: config.server.bind_address()?,
            cors_origins: config.server.cors_origins.clone().unwrap_or_default(),
            request_timeout: config.server.request_timeout(),
            setup_path: config.server.setup_path().to_string(),
            oauth,
            credentials: ServerCredentials {
                use_env_credentials: yoto.use_env_credentials(),
                client_id: yoto.client_id.clone(),
                client_secret: yoto.client_secret.clone(),
                refresh_token: yoto.refresh_token.clone(),
                api_base_url: yoto.api_base_url.clone(),
            },
        })
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the upstream request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the OAuth callback redirect target.
    pub fn with_setup_path(mut self, path: impl Into<String>) -> Self {
        self.setup_path = path.into();
        self
    }

    /// Set the identity provider endpoints.
    pub fn with_oauth(mut self, oauth: OAuthConfig) -> Self {
        self.oauth = oauth;
        self
    }

    /// Set deployment credentials.
    pub fn with_credentials(mut self, credentials: ServerCredentials) -> Self {
        self.credentials = credentials;
        self
    }
}
