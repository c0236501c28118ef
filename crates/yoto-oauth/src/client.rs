//! Authenticated client for the Yoto resource API.
//!
//! Holds one request's [`ClientContext`], keeps its access token usable and
//! retries a call once after a 403 by re-authenticating.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::context::{ClientContext, presence};
use crate::error::{OAuthError, Result};
use crate::oauth::{OAuthConfig, refresh_access_token};

/// Timeout applied to upstream calls unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared HTTP client used for all upstream calls.
///
/// A zero timeout would fail every call immediately and is treated as unset.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    let timeout = if timeout.is_zero() {
        DEFAULT_REQUEST_TIMEOUT
    } else {
        timeout
    };
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(format!("yoto-proxy/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(OAuthError::from)
}

/// Extra pieces of an upstream request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    /// Merged into the request; `Authorization` is always replaced.
    pub headers: HeaderMap,
    pub json: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// Client for one inbound request.
#[derive(Debug)]
pub struct YotoClient {
    http: reqwest::Client,
    oauth: Arc<OAuthConfig>,
    context: ClientContext,
}

impl YotoClient {
    pub fn new(http: reqwest::Client, oauth: Arc<OAuthConfig>, context: ClientContext) -> Self {
        Self {
            http,
            oauth,
            context,
        }
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn has_access_token(&self) -> bool {
        self.context.access_token.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Token lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a refresh-token grant and adopt the new token.
    ///
    /// Returns `Ok(false)` when the identity provider cannot be reached or
    /// refuses the grant; callers may keep using the token they have.
    pub async fn authenticate(&mut self) -> Result<bool> {
        let (Some(client_id), Some(client_secret)) =
            (self.context.client_id.clone(), self.context.client_secret.clone())
        else {
            return Err(OAuthError::MissingCredentials(
                "client id and client secret must be configured".to_string(),
            ));
        };
        let Some(refresh_token) = self.context.refresh_token.clone() else {
            return Err(OAuthError::MissingCredentials(
                "refresh token is required".to_string(),
            ));
        };

        match refresh_access_token(
            &self.http,
            &self.oauth,
            &client_id,
            &client_secret,
            &refresh_token,
        )
        .await
        {
            Ok(tokens) => {
                let expiry = tokens.expiry_from(Utc::now());
                self.context.access_token = Some(tokens.access_token);
                self.context.token_expiry = Some(expiry);
                if let Some(rotated) = tokens.refresh_token {
                    self.context.refresh_token = Some(rotated);
                }
                tracing::info!(token_expiry = %expiry, "Access token refreshed");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Authentication failed");
                Ok(false)
            }
        }
    }

    /// Make sure a usable access token is held before a call.
    pub async fn ensure_authenticated(&mut self) -> Result<()> {
        let expired = self.context.is_token_expired();
        tracing::debug!(
            access_token = presence(&self.context.access_token),
            refresh_token = presence(&self.context.refresh_token),
            token_expiry = ?self.context.token_expiry,
            expired,
            "Checking authentication"
        );

        if self.context.access_token.is_none() {
            return Err(OAuthError::NoAccessToken);
        }

        if expired && self.context.has_refresh_credentials() {
            tracing::debug!("Token expired, refreshing");
            if !self.authenticate().await? {
                return Err(OAuthError::AuthenticationFailed(
                    "token refresh was rejected".to_string(),
                ));
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    fn bearer(&self) -> Result<HeaderValue> {
        let token = self
            .context
            .access_token
            .as_deref()
            .ok_or(OAuthError::NoAccessToken)?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            OAuthError::InvalidRequest("access token contains invalid characters".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<reqwest::Response> {
        let mut headers = options.headers.clone();
        headers.insert(AUTHORIZATION, self.bearer()?);

        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(headers)
            .query(&options.query);
        if let Some(body) = &options.json {
            request = request.json(body);
        }

        let response = request.send().await?;
        tracing::debug!(%method, url, status = response.status().as_u16(), "Upstream response");
        Ok(response)
    }

    /// Issue an authenticated call and parse its JSON body.
    ///
    /// A 403 with full refresh credentials triggers one re-authentication and
    /// one resend of the identical request; nothing further is retried.
    pub async fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Value> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.context.base_url, endpoint);
        let mut response = self.send(&method, &url, &options).await?;

        if response.status() == StatusCode::FORBIDDEN && self.context.has_refresh_credentials() {
            tracing::info!(%method, endpoint, "Got 403, refreshing token and retrying once");
            if self.authenticate().await? {
                response = self.send(&method, &url, &options).await?;
            } else {
                tracing::warn!(endpoint, "Token refresh after 403 failed");
            }
        }

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let snippet: String = body.chars().take(500).collect();
            tracing::warn!(%method, endpoint, status = status.as_u16(), body = %snippet, "Upstream request failed");
            return Err(OAuthError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            OAuthError::MalformedUpstreamResponse(format!("{} {}: {}", method, endpoint, e))
        })
    }

    pub async fn get(&mut self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        self.request(Method::GET, endpoint, options).await
    }

    pub async fn post(&mut self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        self.request(Method::POST, endpoint, options).await
    }

    pub async fn put(&mut self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        self.request(Method::PUT, endpoint, options).await
    }

    pub async fn delete(&mut self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        self.request(Method::DELETE, endpoint, options).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Yoto resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Family information, verbatim.
    pub async fn get_family(&mut self) -> Result<Value> {
        self.get("/family", RequestOptions::new()).await
    }

    /// Players (devices) of the family.
    pub async fn get_players(&mut self) -> Result<Vec<Value>> {
        let response = self
            .get("/device-v2/devices/mine", RequestOptions::new())
            .await?;
        let devices = array_field(&response, "devices");
        tracing::debug!(count = devices.len(), "Fetched devices");
        Ok(devices)
    }

    /// A single player.
    pub async fn get_player(&mut self, player_id: &str) -> Result<Value> {
        let endpoint = format!("/devices/{}", path_segment(player_id)?);
        self.get(&endpoint, RequestOptions::new()).await
    }

    /// The user's own content library.
    pub async fn get_library(&mut self) -> Result<Vec<Value>> {
        let response = self.get("/content/mine", RequestOptions::new()).await?;
        let cards = array_field(&response, "cards");
        tracing::debug!(count = cards.len(), "Fetched library");
        Ok(cards)
    }

    /// Card detail, with signed streamable URLs when `playable`.
    pub async fn get_card(&mut self, card_id: &str, playable: bool) -> Result<Value> {
        let mut options = RequestOptions::new();
        if playable {
            options = options.query("playable", "true").query("signingType", "s3");
        }
        let endpoint = format!("/content/{}", path_segment(card_id)?);
        self.get(&endpoint, options).await
    }
}

/// Encode a caller-supplied id as exactly one path segment.
///
/// `/`, `?` and `#` are escaped; dot segments are refused since the URL
/// parser would resolve them against the parent path.
fn path_segment(id: &str) -> Result<String> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(OAuthError::InvalidRequest(format!(
            "invalid resource id: {:?}",
            id
        )));
    }
    Ok(urlencoding::encode(id).into_owned())
}

/// `value[field]` when it is an array, otherwise empty.
fn array_field(value: &Value, field: &str) -> Vec<Value> {
    value
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
