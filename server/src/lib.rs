//! Delta Server - HTTP host for the delta sync engine.
//!
//! The server owns one explicitly constructed [`Account`] and serves it over
//! `POST /api`. Request bodies go to the engine untouched; malformed bodies are
//! answered with the engine's transport error and its status.

pub mod config;
pub mod error;
mod handlers;
mod routes;

use crate::config::Config;
use axum::Router;
use delta_engine::Account;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub account: Arc<Account>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the state for a fresh in-memory account described by `config`.
    pub fn from_config(config: Config) -> Self {
        let account =
            Account::in_memory(config.account_id.clone()).with_limits(config.limits.clone());
        Self {
            account: Arc::new(account),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
