//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use delta_engine::Limits;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub account_id: String,
    pub limits: Limits,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        account_id: state.config.account_id.clone(),
        limits: state.config.limits.clone(),
    })
}

/// Root handler.
async fn root() -> &'static str {
    "Delta Sync Server"
}
