//! Landing point for the identity provider's authorization redirect.

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use super::DataResponse;
use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Query parameters the identity provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// Authorization code on success.
    pub code: Option<String>,
    /// Opaque state echoed back from the authorize request.
    pub state: Option<String>,
    /// Error code when the user denied access or login failed.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /callback - Receive the authorization code.
///
/// In server-credential mode the browser is sent on to the configured setup
/// page with `?code=` or `?error=`. Otherwise the code is returned in the
/// success envelope for the page that opened the login popup.
#[utoipa::path(
    get,
    path = "/callback",
    params(CallbackParams),
    responses(
        (status = 302, description = "Redirect to the setup page (server-credential mode)"),
        (status = 200, description = "Authorization code and state", body = DataResponse),
        (status = 400, description = "Login failed or no code", body = crate::error::ErrorResponse),
    ),
    tag = "config"
)]
pub async fn callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    tracing::info!(
        has_code = params.code.is_some(),
        has_state = params.state.is_some(),
        error = params.error.as_deref(),
        "OAuth callback"
    );

    if state.use_env_credentials() {
        let (key, value) = match (&params.error, &params.code) {
            (Some(error), _) => ("error", error.as_str()),
            (None, Some(code)) => ("code", code.as_str()),
            (None, None) => ("error", "missing_code"),
        };
        let location = setup_redirect(&state.config.setup_path, key, value);
        return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
    }

    if let Some(error) = params.error {
        let description = params
            .error_description
            .unwrap_or_else(|| "Authorization failed".to_string());
        return Err(ServerError::BadRequest(format!("{}: {}", error, description)));
    }

    let code = params
        .code
        .ok_or_else(|| ServerError::BadRequest("Missing authorization code".to_string()))?;

    Ok(DataResponse::success(json!({
        "code": code,
        "state": params.state,
    }))
    .into_response())
}

/// `{setup_path}?{key}={value}`, appending to any query the path already has.
fn setup_redirect(setup_path: &str, key: &str, value: &str) -> String {
    let separator = if setup_path.contains('?') { '&' } else { '?' };
    format!(
        "{}{}{}={}",
        setup_path,
        separator,
        key,
        urlencoding::encode(value)
    )
}
