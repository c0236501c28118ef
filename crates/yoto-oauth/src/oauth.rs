//! OAuth 2.0 grants against the Yoto identity provider.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, Result};

/// Yoto token endpoint.
pub const YOTO_TOKEN_URL: &str = "https://login.yotoplay.com/oauth/token";

/// Yoto authorize endpoint.
pub const YOTO_AUTHORIZE_URL: &str = "https://login.yotoplay.com/oauth/authorize";

/// Audience sent with every grant and authorize redirect.
pub const YOTO_AUDIENCE: &str = "https://api.yotoplay.com";

/// Scope requested when starting the browser login.
pub const YOTO_SCOPE: &str = "offline_access library:read players:read family:read";

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Tokens are treated as expired this long before the upstream says so.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Longest lifetime taken at face value (one year).
pub const MAX_EXPIRES_IN_SECS: u64 = 365 * 24 * 60 * 60;

/// Identity provider endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthConfig {
    pub token_url: String,
    pub authorize_url: String,
    pub audience: String,
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::yoto()
    }
}

impl OAuthConfig {
    /// Public Yoto endpoints.
    pub fn yoto() -> Self {
        Self {
            token_url: YOTO_TOKEN_URL.to_string(),
            authorize_url: YOTO_AUTHORIZE_URL.to_string(),
            audience: YOTO_AUDIENCE.to_string(),
            scope: YOTO_SCOPE.to_string(),
        }
    }

    /// Point grants at a different token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Point the login redirect at a different authorize endpoint.
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// Build the authorize URL the browser is redirected to.
pub fn build_authorization_url(config: &OAuthConfig, client_id: &str, redirect_uri: &str) -> String {
    let params = [
        ("response_type", "code"),
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("scope", config.scope.as_str()),
        ("audience", config.audience.as_str()),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// Token endpoint response as far as the client cares about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Expiry estimate for this token relative to `now`.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        token_expiry(now, self.expires_in)
    }
}

/// `now + expires_in - 60s`, with `expires_in` defaulting to one hour.
///
/// Lifetimes are capped at [`MAX_EXPIRES_IN_SECS`]. If the sum still does not
/// fit a timestamp, `now` is returned and the token counts as expired.
pub fn token_expiry(now: DateTime<Utc>, expires_in: Option<u64>) -> DateTime<Utc> {
    let secs = expires_in
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
        .min(MAX_EXPIRES_IN_SECS) as i64;
    Duration::try_seconds(secs - EXPIRY_MARGIN_SECS)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(now)
}

#[derive(Debug, Serialize)]
struct AuthorizationCodeRequest<'a> {
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

/// Inputs of an authorization-code exchange.
#[derive(Debug, Clone)]
pub struct CodeExchange<'a> {
    pub code: &'a str,
    pub redirect_uri: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// Exchange an authorization code for tokens.
///
/// The token endpoint body is returned untouched so the browser receives
/// exactly what the identity provider issued.
pub async fn exchange_code_for_tokens(
    http: &reqwest::Client,
    config: &OAuthConfig,
    exchange: CodeExchange<'_>,
) -> Result<serde_json::Value> {
    let request_body = AuthorizationCodeRequest {
        grant_type: "authorization_code",
        code: exchange.code,
        redirect_uri: exchange.redirect_uri,
        client_id: exchange.client_id,
        client_secret: exchange.client_secret,
        audience: &config.audience,
    };

    tracing::debug!(
        token_url = %config.token_url,
        redirect_uri = %exchange.redirect_uri,
        "Exchanging authorization code"
    );

    let response = http
        .post(&config.token_url)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| OAuthError::Network(format!("Token exchange request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| OAuthError::Network(format!("Failed to read token response: {}", e)))?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Token exchange rejected");
        return Err(OAuthError::UpstreamHttp {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        OAuthError::MalformedUpstreamResponse(format!("Failed to parse token response: {}", e))
    })
}

/// Refresh an access token using a refresh token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &OAuthConfig,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let request_body = RefreshTokenRequest {
        grant_type: "refresh_token",
        refresh_token,
        client_id,
        client_secret,
        audience: &config.audience,
    };

    let response = http
        .post(&config.token_url)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| OAuthError::Network(format!("Token refresh request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(OAuthError::UpstreamHttp {
            status: status.as_u16(),
            body,
        });
    }

    response.json().await.map_err(|e| {
        OAuthError::MalformedUpstreamResponse(format!("Failed to parse refresh response: {}", e))
    })
}
