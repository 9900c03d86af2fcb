//! API endpoint routes.

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use delta_engine::Response;

use crate::error::Result;
use crate::handlers::handle_api;
use crate::AppState;

/// Create API routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api", post(api_handler))
}

/// POST /api - Run a batch of method calls.
async fn api_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Response>> {
    let response = handle_api(state.account.clone(), body).await?;
    Ok(Json(response))
}
