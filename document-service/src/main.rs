use std::sync::Arc;

use anyhow::{Context, Result};
use document_storage::{DocumentGateway, HttpTransfer, S3Backend};
use shared::observability::init_logging;

mod app;
mod config;
mod error;
mod handlers;

use app::AppState;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    init_logging(&config.logging)?;

    tracing::info!("Starting Document Service...");

    // One store client for the whole process, handed to the gateway
    let backend = Arc::new(S3Backend::from_config(&config.storage).await);
    if let Err(e) = backend.ensure_bucket().await {
        // Keep serving; /health reports the store as unreachable
        tracing::warn!(error = %e, "Could not verify storage bucket at startup");
    }

    let transfer = Arc::new(HttpTransfer::new(config.storage.transfer_timeout())?);
    let gateway = DocumentGateway::new(backend, transfer, config.storage.clone());

    let state = AppState {
        gateway: Arc::new(gateway),
        max_upload_bytes: config.server.max_upload_bytes(),
    };
    let app = app::router(state, app::cors_layer(&config.server.cors_allowed_origins));

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Document Service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Document Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
