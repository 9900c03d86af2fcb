//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use delta_engine::RequestError;
use serde::Serialize;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    #[error("Request processing aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// Error response body for failures outside the request protocol.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Request(err) => {
                tracing::warn!("Rejected request: {}", err);
                let status = StatusCode::from_u16(err.status).unwrap_or(StatusCode::BAD_REQUEST);
                (status, Json(err)).into_response()
            }
            AppError::Aborted(err) => {
                tracing::error!("Request processing aborted: {:?}", err);
                let body = Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                    details: Some(err.to_string()),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
