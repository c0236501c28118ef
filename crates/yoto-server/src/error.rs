//! Error types for the server.
//!
//! Every failure is rendered as the JSON envelope
//! `{"status": "error", "message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use yoto_oauth::OAuthError;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    BadRequest(String),

    /// Caller supplied no usable credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Server-side credentials are missing or disabled.
    #[error("{0}")]
    Config(String),

    /// Identity provider rejected a code exchange; its status is passed through.
    #[error("Token exchange failed: {body}")]
    TokenExchange { status: u16, body: String },

    /// Failure from the OAuth or resource client.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl From<yoto_config::ConfigError> for ServerError {
    fn from(e: yoto_config::ConfigError) -> Self {
        ServerError::Config(e.to_string())
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    /// Status code and log code for this error.
    pub fn status_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            ServerError::TokenExchange { status, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "token_exchange_failed",
            ),
            ServerError::OAuth(e) => match e {
                OAuthError::NoAccessToken => (StatusCode::UNAUTHORIZED, "no_access_token"),
                OAuthError::MissingCredentials(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "missing_credentials")
                }
                OAuthError::AuthenticationFailed(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "authentication_failed")
                }
                OAuthError::UpstreamHttp { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error")
                }
                OAuthError::MalformedUpstreamResponse(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "malformed_upstream")
                }
                OAuthError::Network(_) => (StatusCode::INTERNAL_SERVER_ERROR, "network_error"),
                OAuthError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            },
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Message shown to the caller. Upstream resource bodies stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::OAuth(OAuthError::UpstreamHttp { status, .. }) => {
                format!("Yoto API request failed with HTTP {}", status)
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_code();
        let message = self.public_message();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %self, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %self, "Client error");
        }

        let body = ErrorResponse {
            status: "error".to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
