mod api;
mod classifier;
mod config;
mod error;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::classifier::{ModelHandle, OnnxModelLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bill_recognition_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!(
        "Starting bill recognition API on {} (max upload {} bytes, input {}x{})",
        config.bind_addr(),
        config.max_content_length,
        config.image_size,
        config.image_size
    );

    std::fs::create_dir_all(&config.upload_dir)?;
    tracing::info!("Scratch directory at {}", config.upload_dir.display());

    let loader = OnnxModelLoader::new(config.model_candidates(), config.image_size);
    let state = Arc::new(api::AppState {
        config: config.clone(),
        model: ModelHandle::new(Arc::new(loader)),
    });

    // A missing model is not fatal: /predict retries the load on demand.
    if let Err(e) = state.model.get_or_load().await {
        tracing::warn!("Model not loaded at startup: {}", e);
    }

    let app = api::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("Listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
