//! Danmu API Server
//!
//! Main entry point for the upload back office.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use danmu_api::{AppState, create_router};
use danmu_core::storage::StorageConfig;
use danmu_core::upload::UploadService;
use danmu_shared::{AppConfig, LogFormat, StorageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(config.logging.format);

    let uploads = build_upload_service(&config.storage);
    let state = AppState::new(uploads);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "danmu=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Storage stays unconfigured when settings are incomplete; upload routes
/// then answer 500 while the rest of the server keeps running.
fn build_upload_service(settings: &StorageSettings) -> Option<Arc<UploadService>> {
    let config = match StorageConfig::from_settings(settings) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Object storage not configured");
            return None;
        }
    };

    let bucket = config.bucket.clone();
    let endpoint = config.endpoint.clone();
    match UploadService::from_config(config) {
        Ok(service) => {
            info!(bucket = %bucket, endpoint = %endpoint, "Object storage configured");
            Some(Arc::new(service))
        }
        Err(e) => {
            warn!(error = %e, "Failed to initialize object storage");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
