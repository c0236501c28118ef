//! Authorization-code exchange endpoints.
//!
//! Both endpoints return the identity provider's token body untouched inside
//! the success envelope. A rejected exchange keeps the provider's status code.

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use yoto_oauth::{CodeExchange, OAuthError, oauth::exchange_code_for_tokens};

use super::DataResponse;
use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Body of an authorization-code exchange.
///
/// `clientId` and `clientSecret` are ignored by `auth/token-account`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenExchangeRequest {
    pub code: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

impl TokenExchangeRequest {
    fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| ServerError::BadRequest(format!("Invalid JSON body: {}", e)))
    }
}

/// Treat empty strings like absent fields.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// POST /api/auth/token - Exchange a code with caller-supplied client credentials.
#[utoipa::path(
    post,
    path = "/api/auth/token",
    request_body = TokenExchangeRequest,
    responses(
        (status = 200, description = "Tokens issued", body = DataResponse),
        (status = 400, description = "Missing parameters", body = crate::error::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn exchange_token_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DataResponse>> {
    let request = TokenExchangeRequest::parse(&body)?;

    let fields = [
        ("code", non_empty(&request.code)),
        ("clientId", non_empty(&request.client_id)),
        ("clientSecret", non_empty(&request.client_secret)),
        ("redirectUri", non_empty(&request.redirect_uri)),
    ];
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();
    let [Some(code), Some(client_id), Some(client_secret), Some(redirect_uri)] =
        fields.map(|(_, value)| value)
    else {
        return Err(ServerError::BadRequest(format!(
            "Missing required parameters: {}",
            missing.join(", ")
        )));
    };

    exchange(
        &state,
        CodeExchange {
            code,
            redirect_uri,
            client_id,
            client_secret,
        },
    )
    .await
}

/// POST /api/auth/token-account - Exchange a code with the deployment's client credentials.
#[utoipa::path(
    post,
    path = "/api/auth/token-account",
    request_body = TokenExchangeRequest,
    responses(
        (status = 200, description = "Tokens issued", body = DataResponse),
        (status = 400, description = "Server mode disabled or missing parameters", body = crate::error::ErrorResponse),
        (status = 500, description = "Server credentials not configured", body = crate::error::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn exchange_token_account_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DataResponse>> {
    let request = TokenExchangeRequest::parse(&body)?;

    if !state.use_env_credentials() {
        return Err(ServerError::BadRequest(
            "Server credentials not enabled".to_string(),
        ));
    }

    let (Some(code), Some(redirect_uri)) =
        (non_empty(&request.code), non_empty(&request.redirect_uri))
    else {
        return Err(ServerError::BadRequest(
            "Missing required parameters: code or redirectUri".to_string(),
        ));
    };

    let server = state.resolver.server();
    let (Some(client_id), Some(client_secret)) = (
        non_empty(&server.client_id),
        non_empty(&server.client_secret),
    ) else {
        return Err(ServerError::Config(
            "Server credentials not configured".to_string(),
        ));
    };

    exchange(
        &state,
        CodeExchange {
            code,
            redirect_uri,
            client_id,
            client_secret,
        },
    )
    .await
}

async fn exchange(state: &AppState, exchange: CodeExchange<'_>) -> Result<Json<DataResponse>> {
    match exchange_code_for_tokens(&state.http, &state.oauth, exchange).await {
        Ok(tokens) => {
            tracing::info!("Authorization code exchanged");
            Ok(DataResponse::success(tokens))
        }
        Err(OAuthError::UpstreamHttp { status, body }) => {
            Err(ServerError::TokenExchange { status, body })
        }
        Err(e) => Err(e.into()),
    }
}
