//! Server mode discovery and the server-credential login redirect.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use yoto_oauth::oauth::build_authorization_url;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Whether the deployment supplies its own OAuth client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckConfigResponse {
    /// Always `"success"`.
    pub status: String,
    /// Server-credential mode flag.
    pub use_env_credentials: bool,
}

/// GET /api/check-config/ - Report the credential mode.
#[utoipa::path(
    get,
    path = "/api/check-config/",
    responses(
        (status = 200, description = "Credential mode", body = CheckConfigResponse),
    ),
    tag = "config"
)]
pub async fn check_config_handler(State(state): State<AppState>) -> Json<CheckConfigResponse> {
    let use_env_credentials = state.use_env_credentials();
    tracing::debug!(use_env_credentials, "Config check");
    Json(CheckConfigResponse {
        status: "success".to_string(),
        use_env_credentials,
    })
}

/// GET /api/start-oauth/ - Redirect to the Yoto login page.
///
/// The callback is `{scheme}://{host}/callback` for the host the browser used.
#[utoipa::path(
    get,
    path = "/api/start-oauth/",
    responses(
        (status = 302, description = "Redirect to the identity provider"),
        (status = 500, description = "Server credentials not configured", body = crate::error::ErrorResponse),
    ),
    tag = "config"
)]
pub async fn start_oauth_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let credentials = &state.config.credentials;
    let client_id = match (&credentials.client_id, credentials.use_env_credentials) {
        (Some(id), true) => id,
        _ => {
            return Err(ServerError::Config(
                "Server credentials not configured".to_string(),
            ));
        }
    };

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.bind_address.to_string());
    let redirect_uri = format!("{}://{}/callback", request_scheme(&headers), host);
    let location = build_authorization_url(&state.oauth, client_id, &redirect_uri);

    tracing::info!(redirect_uri = %redirect_uri, "Starting OAuth flow");

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Scheme the browser used, as reported by a fronting proxy.
fn request_scheme(headers: &HeaderMap) -> &str {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| *v == "https" || *v == "http")
        .unwrap_or("http")
}
