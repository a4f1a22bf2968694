//! cosgate server
//!
//! Main entry point: serves private-bucket objects and accepts uploads.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cosgate_api::{AppState, create_router};
use cosgate_core::storage::{AdapterConfig, StorageConfig, StorageService};
use cosgate_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cosgate=debug,cosgate_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; COS_* variables override the storage section
    let config = AppConfig::load().context("failed to load configuration")?;
    let adapter = AdapterConfig::from_env(&config.storage);
    let storage_config = StorageConfig::from_settings(&config.storage, adapter)?;

    let storage = Arc::new(StorageService::from_config(storage_config)?);
    info!(
        backend = storage.provider_name(),
        bucket = %storage.config().bucket,
        "Storage adapter ready"
    );

    let state = AppState::new(storage, config.server.mount_path.as_deref())
        .with_max_upload_bytes(config.server.max_upload_bytes);
    info!(mount = %state.mount_path, "Serve handler mounted");

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
