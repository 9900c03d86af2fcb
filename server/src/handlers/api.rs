//! API handler - runs a method-call batch against the hosted account.

use crate::error::Result;
use axum::body::Bytes;
use delta_engine::{Account, Response};
use std::sync::Arc;

/// Process a raw request body.
///
/// The engine is synchronous, so the batch runs on the blocking pool and the
/// async workers stay free while a large batch executes.
pub async fn handle_api(account: Arc<Account>, body: Bytes) -> Result<Response> {
    let response = tokio::task::spawn_blocking(move || account.process_json(&body)).await??;

    tracing::debug!(
        "Processed batch with {} method responses",
        response.method_responses.len()
    );

    Ok(response)
}
