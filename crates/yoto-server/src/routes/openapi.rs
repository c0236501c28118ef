//! OpenAPI document for the proxy.

use axum::Json;
use utoipa::OpenApi;

use super::{auth, callback, config, health, yoto};
use crate::error::ErrorResponse;

/// OpenAPI documentation for the Yoto proxy API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Yoto Proxy API",
        description = "OAuth and passthrough endpoints for Yoto browser clients",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        health::health,
        config::check_config_handler,
        config::start_oauth_handler,
        callback::callback_handler,
        auth::exchange_token_handler,
        auth::exchange_token_account_handler,
        yoto::test_connection_handler,
        yoto::family_handler,
        yoto::players_handler,
        yoto::player_handler,
        yoto::library_handler,
        yoto::card_handler,
    ),
    components(
        schemas(
            health::HealthResponse,
            config::CheckConfigResponse,
            auth::TokenExchangeRequest,
            super::DataResponse,
            super::MessageResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "config", description = "Credential mode and login redirect"),
        (name = "auth", description = "Authorization-code exchange"),
        (name = "yoto", description = "Yoto resource passthrough"),
    )
)]
pub struct ApiDoc;

/// GET /api/openapi.json
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
