//! Request-scoped credential state.

use chrono::{DateTime, Utc};

/// Default root of the Yoto resource API.
pub const YOTO_API_BASE_URL: &str = "https://api.yotoplay.com";

/// Credentials and token state for one inbound request.
///
/// Built fresh by the resolver for every request and dropped with it. Only
/// the authenticate step mutates the token fields.
#[derive(Clone, PartialEq)]
pub struct ClientContext {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// `None` means unknown; a present token is then treated as valid.
    pub token_expiry: Option<DateTime<Utc>>,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            base_url: YOTO_API_BASE_URL.to_string(),
            client_id: None,
            client_secret: None,
            access_token: None,
            refresh_token: None,
            token_expiry: None,
        }
    }
}

impl ClientContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client_id: Option<String>, client_secret: Option<String>) -> Self {
        self.client_id = client_id;
        self.client_secret = client_secret;
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_token_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.token_expiry = Some(expiry);
        self
    }

    /// Client id, secret and refresh token are all present.
    pub fn has_refresh_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }

    /// Whether the held token should be considered expired at `now`.
    ///
    /// A token with no known expiry counts as valid until a 403 says otherwise.
    pub fn is_token_expired_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.token_expiry) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(expiry)) => now >= expiry,
        }
    }

    pub fn is_token_expired(&self) -> bool {
        self.is_token_expired_at(Utc::now())
    }
}

// Credentials never reach logs or panics.
impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("base_url", &self.base_url)
            .field("client_id", &presence(&self.client_id))
            .field("client_secret", &presence(&self.client_secret))
            .field("access_token", &presence(&self.access_token))
            .field("refresh_token", &presence(&self.refresh_token))
            .field("token_expiry", &self.token_expiry)
            .finish()
    }
}

/// `"present"` or `"missing"`, for structured logs.
pub fn presence<T>(value: &Option<T>) -> &'static str {
    if value.is_some() { "present" } else { "missing" }
}
