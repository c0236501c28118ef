//! API routes.

pub mod auth;
pub mod callback;
pub mod config;
pub mod health;
pub mod openapi;
pub mod yoto;

pub use auth::{TokenExchangeRequest, exchange_token_account_handler, exchange_token_handler};
pub use callback::{CallbackParams, callback_handler};
pub use config::{CheckConfigResponse, check_config_handler, start_oauth_handler};
pub use health::health_routes;
pub use openapi::{ApiDoc, openapi_handler};
pub use yoto::{
    card_handler, family_handler, library_handler, player_handler, players_handler,
    test_connection_handler,
};

use axum::{Json, Router, routing::MethodRouter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::state::AppState;

/// Success envelope carrying upstream data.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataResponse {
    /// Always `"success"`.
    pub status: String,
    /// Payload, passed through from Yoto.
    #[schema(value_type = Object)]
    pub data: Value,
}

impl DataResponse {
    pub fn success(data: Value) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            data,
        })
    }
}

/// Success envelope carrying a message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Always `"success"`.
    pub status: String,
    pub message: String,
}

/// Register `path`, and its bare form when it ends in `/`.
pub(crate) fn route_with_bare(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    let router = router.route(path, method_router.clone());
    match path.strip_suffix('/') {
        Some(bare) if !bare.is_empty() => router.route(bare, method_router),
        _ => router,
    }
}

/// Routes served outside the API prefix.
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/callback", axum::routing::get(callback_handler))
}

/// All routes served under the API prefix.
pub fn api_routes() -> Router<AppState> {
    use axum::routing::{get, post};

    let routes = [
        ("/check-config/", get(check_config_handler)),
        ("/start-oauth/", get(start_oauth_handler)),
        ("/auth/token", post(exchange_token_handler)),
        ("/auth/token-account", post(exchange_token_account_handler)),
        ("/test/", get(test_connection_handler)),
        ("/family/", get(family_handler)),
        ("/players/", get(players_handler)),
        ("/players/{id}/", get(player_handler)),
        ("/library/", get(library_handler)),
        ("/card/{id}/", get(card_handler)),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            route_with_bare(router, path, method_router)
        })
        .route("/openapi.json", get(openapi_handler))
}
