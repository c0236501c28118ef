//! Yoto resource passthrough endpoints.
//!
//! `players/`, `library/` and `card/{id}/` act for the caller using their
//! credential headers. `test/`, `family/` and `players/{id}/` act as the
//! deployment using server-held credentials.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde_json::Value;
use yoto_oauth::YotoClient;

use super::{DataResponse, MessageResponse};
use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Client for the caller, rejecting requests that carry no access token.
fn caller_client(state: &AppState, headers: &HeaderMap) -> Result<YotoClient> {
    let client = state.client_for_headers(headers);
    if !client.has_access_token() {
        return Err(ServerError::Unauthorized(
            "No access token provided".to_string(),
        ));
    }
    Ok(client)
}

/// GET /api/test/ - Check the server credentials against Yoto.
#[utoipa::path(
    get,
    path = "/api/test/",
    responses(
        (status = 200, description = "Connected", body = MessageResponse),
        (status = 500, description = "Authentication failed", body = crate::error::ErrorResponse),
    ),
    tag = "yoto"
)]
pub async fn test_connection_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.server_client().await?;
    Ok(Json(MessageResponse {
        status: "success".to_string(),
        message: "Successfully connected to Yoto API".to_string(),
    }))
}

/// GET /api/family/ - Family information.
#[utoipa::path(
    get,
    path = "/api/family/",
    responses(
        (status = 200, description = "Family", body = DataResponse),
        (status = 500, description = "Upstream or configuration failure", body = crate::error::ErrorResponse),
    ),
    tag = "yoto"
)]
pub async fn family_handler(State(state): State<AppState>) -> Result<Json<DataResponse>> {
    let mut client = state.server_client().await?;
    let family = client.get_family().await?;
    Ok(DataResponse::success(family))
}

/// GET /api/players/ - The caller's players.
#[utoipa::path(
    get,
    path = "/api/players/",
    params(
        ("X-Access-Token" = String, Header, description = "Caller's access token"),
    ),
    responses(
        (status = 200, description = "Players", body = DataResponse),
        (status = 401, description = "No access token", body = crate::error::ErrorResponse),
    ),
    tag = "yoto"
)]
pub async fn players_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DataResponse>> {
    let mut client = caller_client(&state, &headers)?;
    let players = client.get_players().await?;
    Ok(DataResponse::success(Value::Array(players)))
}

/// GET /api/players/{id}/ - One player.
#[utoipa::path(
    get,
    path = "/api/players/{id}/",
    params(("id" = String, Path, description = "Player id")),
    responses(
        (status = 200, description = "Player", body = DataResponse),
        (status = 500, description = "Upstream or configuration failure", body = crate::error::ErrorResponse),
    ),
    tag = "yoto"
)]
pub async fn player_handler(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<DataResponse>> {
    let mut client = state.server_client().await?;
    let player = client.get_player(&player_id).await?;
    Ok(DataResponse::success(player))
}

/// GET /api/library/ - The caller's card library.
#[utoipa::path(
    get,
    path = "/api/library/",
    params(
        ("X-Access-Token" = String, Header, description = "Caller's access token"),
    ),
    responses(
        (status = 200, description = "Cards", body = DataResponse),
        (status = 401, description = "No access token", body = crate::error::ErrorResponse),
    ),
    tag = "yoto"
)]
pub async fn library_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DataResponse>> {
    let mut client = caller_client(&state, &headers)?;
    let cards = client.get_library().await?;
    Ok(DataResponse::success(Value::Array(cards)))
}

/// GET /api/card/{id}/ - Card detail with playable media URLs.
#[utoipa::path(
    get,
    path = "/api/card/{id}/",
    params(
        ("id" = String, Path, description = "Card id"),
        ("X-Access-Token" = String, Header, description = "Caller's access token"),
    ),
    responses(
        (status = 200, description = "Card", body = DataResponse),
        (status = 401, description = "No access token", body = crate::error::ErrorResponse),
    ),
    tag = "yoto"
)]
pub async fn card_handler(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DataResponse>> {
    let mut client = caller_client(&state, &headers)?;
    let card = client.get_card(&card_id, true).await?;
    Ok(DataResponse::success(card))
}
