//! HTTP surface for aimpact.
//!
//! Upload and blob endpoints over the in-memory [`BlobStore`], the
//! reference-data endpoints over a [`ReferenceStore`], and a ping endpoint.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use handlers::ApiError;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::reference::ReferenceStore;
use crate::storage::{spawn_cleanup, BlobStore};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Uploaded blobs.
    pub blobs: Arc<BlobStore>,
    /// Reference data document.
    pub reference: Arc<ReferenceStore>,
    /// Prefix for blob URLs in upload responses.
    pub public_base_url: String,
    /// Largest accepted upload body.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Build state from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            blobs: Arc::new(BlobStore::new(config.retention())),
            reference: Arc::new(ReferenceStore::new(config.reference_path())),
            public_base_url: config.server.public_base_url.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let upload = Router::new()
        .route("/api/upload", post(handlers::upload))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    Router::new()
        .merge(upload)
        .route(
            "/api/blobs/{id}",
            get(handlers::get_blob).delete(handlers::delete_blob),
        )
        .route("/api/ping", get(handlers::ping))
        .route(
            "/api/reference-data",
            get(handlers::get_reference_data).post(handlers::replace_reference_data),
        )
        .route(
            "/api/reference-data/{category}",
            get(handlers::get_category).put(handlers::update_category),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the reference data
/// cannot be seeded.
pub async fn serve(config: &Config) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .map_err(|_| Error::ConfigValidation {
            message: format!("invalid bind_address: {}", config.server.bind_address),
        })?;

    let state = AppState::from_config(config);
    state.reference.ensure_seeded().await?;
    let retention = state.blobs.retention();
    let cleanup = retention
        .is_bounded()
        .then(|| spawn_cleanup(state.blobs.clone(), config.cleanup_interval()));

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", listener.local_addr()?);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Some(cleanup) = cleanup {
        cleanup.abort();
    }
    served?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
