//! Credential resolution from request headers and server configuration.

use reqwest::header::HeaderMap;

use crate::context::{ClientContext, presence};

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const CLIENT_SECRET_HEADER: &str = "x-client-secret";

/// Credential values a caller may send with a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialHeaders {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl CredentialHeaders {
    /// Read the four credential headers. Empty or non-ASCII values count as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            access_token: get(ACCESS_TOKEN_HEADER),
            refresh_token: get(REFRESH_TOKEN_HEADER),
            client_id: get(CLIENT_ID_HEADER),
            client_secret: get(CLIENT_SECRET_HEADER),
        }
    }
}

/// Deployment-wide credentials and defaults.
#[derive(Clone, Default, PartialEq)]
pub struct ServerCredentials {
    /// Server-credential mode: the deployment's client id/secret serve every caller.
    pub use_env_credentials: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Refresh token used by the endpoints that act as the deployment itself.
    pub refresh_token: Option<String>,
    pub api_base_url: Option<String>,
}

impl std::fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCredentials")
            .field("use_env_credentials", &self.use_env_credentials)
            .field("client_id", &presence(&self.client_id))
            .field("client_secret", &presence(&self.client_secret))
            .field("refresh_token", &presence(&self.refresh_token))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Builds a [`ClientContext`] per request.
///
/// Resolution never fails; missing values surface when the client first needs them.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    server: ServerCredentials,
}

impl CredentialResolver {
    pub fn new(server: ServerCredentials) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &ServerCredentials {
        &self.server
    }

    fn base_context(&self) -> ClientContext {
        match &self.server.api_base_url {
            Some(url) => ClientContext::new().with_base_url(url.clone()),
            None => ClientContext::new(),
        }
    }

    /// Context for a caller-authenticated request.
    ///
    /// In server-credential mode the client id/secret always come from the
    /// server, whatever the caller sent. Access and refresh tokens always come
    /// from the caller.
    pub fn resolve(&self, headers: &CredentialHeaders) -> ClientContext {
        tracing::debug!(
            access_token = presence(&headers.access_token),
            refresh_token = presence(&headers.refresh_token),
            client_id = presence(&headers.client_id),
            client_secret = presence(&headers.client_secret),
            use_env_credentials = self.server.use_env_credentials,
            "Resolving request credentials"
        );

        let mut ctx = self.base_context();
        if self.server.use_env_credentials {
            ctx.client_id = self.server.client_id.clone();
            ctx.client_secret = self.server.client_secret.clone();
        } else {
            ctx.client_id = headers.client_id.clone();
            ctx.client_secret = headers.client_secret.clone();
        }
        ctx.access_token = headers.access_token.clone();
        ctx.refresh_token = headers.refresh_token.clone();
        ctx
    }

    /// Context acting as the deployment itself, from server configuration only.
    pub fn server_context(&self) -> ClientContext {
        let mut ctx = self.base_context();
        ctx.client_id = self.server.client_id.clone();
        ctx.client_secret = self.server.client_secret.clone();
        ctx.refresh_token = self.server.refresh_token.clone();

        tracing::debug!(
            client_id = presence(&ctx.client_id),
            client_secret = presence(&ctx.client_secret),
            refresh_token = presence(&ctx.refresh_token),
            "Resolved server credentials"
        );
        ctx
    }
}
