//! Classroom Service - HTTP API for cascading deletion
//!
//! This is the main entry point for the classroom service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classroom_cascade::CascadeEngine;
use classroom_service::{build_blob_store, create_router, AppState, ServiceConfig};
use classroom_store::RocksRecordStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,classroom=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Classroom Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        blob_backend = ?config.blob_backend,
        bucket = %config.cascade.bucket,
        batch_size = config.cascade.max_batch_size,
        "Service configuration loaded"
    );

    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let records = Arc::new(RocksRecordStore::open(&config.data_dir)?);
    let blobs = build_blob_store(&config)?;

    let engine = Arc::new(CascadeEngine::new(records, blobs, config.cascade.clone())?);
    let state = AppState::new(engine, config.clone());

    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
