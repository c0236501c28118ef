//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderMap;
use yoto_oauth::{
    CredentialHeaders, CredentialResolver, OAuthConfig, OAuthError, YotoClient, http_client,
};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Application state shared across all handlers.
///
/// Holds only immutable configuration and the pooled HTTP client; token
/// state lives in the per-request [`YotoClient`].
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Pooled upstream HTTP client with the configured timeout.
    pub http: reqwest::Client,

    /// Identity provider endpoints.
    pub oauth: Arc<OAuthConfig>,

    /// Builds per-request credential contexts.
    pub resolver: Arc<CredentialResolver>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let http = http_client(config.request_timeout)?;
        Ok(Self {
            oauth: Arc::new(config.oauth.clone()),
            resolver: Arc::new(CredentialResolver::new(config.credentials.clone())),
            config: Arc::new(config),
            http,
        })
    }

    /// Whether server-credential mode is on.
    pub fn use_env_credentials(&self) -> bool {
        self.config.credentials.use_env_credentials
    }

    /// Client acting for the caller, from their credential headers.
    pub fn client_for_headers(&self, headers: &HeaderMap) -> YotoClient {
        let context = self
            .resolver
            .resolve(&CredentialHeaders::from_headers(headers));
        YotoClient::new(self.http.clone(), self.oauth.clone(), context)
    }

    /// Client acting as the deployment itself.
    ///
    /// The server holds no access token, so one is obtained up front with
    /// an explicit refresh grant.
    pub async fn server_client(&self) -> Result<YotoClient> {
        let context = self.resolver.server_context();
        if !context.has_refresh_credentials() {
            return Err(ServerError::Config(
                "Server credentials not configured".to_string(),
            ));
        }

        let mut client = YotoClient::new(self.http.clone(), self.oauth.clone(), context);
        if !client.authenticate().await? {
            return Err(OAuthError::AuthenticationFailed(
                "refresh with server credentials was rejected".to_string(),
            )
            .into());
        }
        Ok(client)
    }
}
