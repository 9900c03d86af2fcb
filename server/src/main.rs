//! Delta Server binary.

use delta_server::config::Config;
use delta_server::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "delta_server=debug,delta_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Delta Server on {}:{}", config.host, config.port);
    tracing::info!(
        "Hosting account {} (maxObjectsInGet={}, maxObjectsInSet={}, maxChanges={})",
        config.account_id,
        config.limits.max_objects_in_get,
        config.limits.max_objects_in_set,
        config.limits.max_changes
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::from_config(config);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
