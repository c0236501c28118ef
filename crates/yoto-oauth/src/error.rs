//! Error types for the OAuth and API client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors raised while resolving credentials or talking to Yoto.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Client id, secret or refresh token needed for a grant is absent.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// No access token is available for an authenticated call.
    #[error("No access token available")]
    NoAccessToken,

    /// Refreshing or exchanging a token did not succeed.
    #[error("Failed to authenticate with Yoto API: {0}")]
    AuthenticationFailed(String),

    /// Upstream answered with a non-2xx status.
    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Upstream answered 2xx with a body that is not JSON.
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// Transport failure (connect, timeout, read).
    #[error("Network error: {0}")]
    Network(String),

    /// Caller-supplied values cannot be sent upstream.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OAuthError {
    /// Upstream status code, if this error carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            OAuthError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
