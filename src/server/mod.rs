//! HTTP API.
//!
//! Exposes job submission, the live progress stream and management of the
//! files in the download directory.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::config::{NamingMode, ServerConfig};
use crate::engine::Engine;
use crate::error::{Error, Result};

pub use error::ApiError;

/// State shared by all handlers.
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Naming used when a submission does not ask for auto-numbering.
    pub naming: NamingMode,
}

/// Build the application router.
pub fn router(engine: Arc<Engine>, naming: NamingMode) -> Router {
    let state = Arc::new(AppState { engine, naming });

    Router::new()
        .route("/add", post(handlers::add_handler))
        .route("/stream", get(handlers::stream_handler))
        .route("/jobs", get(handlers::jobs_handler))
        .route("/files", get(handlers::files_handler))
        .route("/video/:filename", get(handlers::video_handler))
        .route("/rename", post(handlers::rename_handler))
        .route("/delete", post(handlers::delete_handler))
        .route("/find_duplicates", get(handlers::find_duplicates_handler))
        .route("/delete_duplicates", post(handlers::delete_duplicates_handler))
        .route("/health", get(handlers::health_handler))
        .with_state(state)
}

/// Serve the API until Ctrl+C.
pub async fn serve(engine: Arc<Engine>, settings: &ServerConfig, naming: NamingMode) -> Result<()> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            Error::Config(format!("Port {} is already in use", settings.port))
        } else {
            Error::Config(format!("Failed to bind to {}: {}", addr, e))
        }
    })?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(Arc::clone(&engine), naming))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.shutdown();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
