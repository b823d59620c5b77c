//! Fresh/Rotten Produce Classifier
//!
//! Single-route HTTP service that classifies uploaded produce photos with an
//! OpenVINO-compiled model.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fruitscan::api::{create_rest_router, AppState};
use fruitscan::config::Config;
use fruitscan::engine::{Classifier, OpenVinoClassifier};
use fruitscan::service::ClassifyService;
use fruitscan::storage::ScratchStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Starting fruitscan v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load(Config::default_path()).unwrap_or_else(|e| {
        info!("Using default config ({})", e);
        Config::default()
    });

    info!("Configuration loaded:");
    info!("  Listen: {}:{}", config.server.host, config.server.port);
    info!("  Model: {} ({})", config.model.path.display(), config.model.device);
    info!("  Input size: {}x{}", config.preprocess.width, config.preprocess.height);
    info!("  Scratch dir: {}", config.storage.scratch_dir.display());

    // The process cannot serve without its model
    let classifier = Arc::new(
        OpenVinoClassifier::load(&config.model.path, &config.model.device)
            .context("failed to load classifier model")?,
    );
    info!("Classifier ready: {}", classifier.name());

    let scratch = ScratchStore::open(&config.storage.scratch_dir).with_context(|| {
        format!(
            "failed to create scratch directory {}",
            config.storage.scratch_dir.display()
        )
    })?;

    let service = Arc::new(ClassifyService::new(
        classifier,
        scratch,
        config.preprocess.clone(),
    ));

    let app_state = Arc::new(AppState {
        service,
        max_upload_bytes: config.server.max_upload_bytes,
        start_time: Instant::now(),
    });

    let router = create_rest_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("REST API listening on http://{}", addr);
    info!("Predict: POST http://localhost:{}/predict", config.server.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Goodbye!");
    Ok(())
}
