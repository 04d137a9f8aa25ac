//! HTTP service exposing both pipelines.
//!
//! ```text
//! POST /convert-pdf-to-png   multipart `files` → application/zip
//! POST /convert-png-to-pdf   multipart `files` → application/pdf
//! GET  /health               {"status":"healthy"}
//! ```
//!
//! Handlers are thin: collect the multipart parts into
//! [`crate::UploadedItem`]s, call the async pipeline, map the result onto a
//! response. No state is shared between requests beyond the read-only
//! configuration.

pub mod routes;

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use routes::ApiError;

/// Network-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: String,
    /// Default: 8000.
    pub port: u16,
    /// Largest accepted request body, all files together. Default: 100 MiB.
    pub max_upload_bytes: usize,
    /// Per-conversion time budget. `None` disables it. Default: 300 s.
    pub convert_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 100 * 1024 * 1024,
            convert_timeout_secs: Some(300),
        }
    }
}

/// Shared, read-only handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ConversionConfig>,
    pub convert_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(config: ConversionConfig, server: &ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            convert_timeout: server.convert_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Await a conversion, bounded by the configured timeout.
    ///
    /// On timeout the blocking task keeps running to completion and still
    /// releases its workspace; only the response is given up on.
    pub async fn bounded<T, F>(&self, conversion: F) -> Result<T, ConvertError>
    where
        F: Future<Output = Result<T, ConvertError>>,
    {
        match self.convert_timeout {
            Some(limit) => tokio::time::timeout(limit, conversion)
                .await
                .map_err(|_| ConvertError::Timeout {
                    secs: limit.as_secs(),
                })?,
            None => conversion.await,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/convert-pdf-to-png", post(routes::convert_pdf_to_png))
        .route("/convert-png-to-pdf", post(routes::convert_png_to_pdf))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(server: ServerConfig, config: ConversionConfig) -> std::io::Result<()> {
    let app = router(AppState::new(config, &server), server.max_upload_bytes);

    let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
    info!(
        "Listening on http://{} (max upload {} bytes)",
        listener.local_addr()?,
        server.max_upload_bytes
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_times_out_slow_conversions() {
        let state = AppState {
            config: Arc::new(ConversionConfig::default()),
            convert_timeout: Some(Duration::from_millis(10)),
        };
        let result: Result<(), _> = state
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ConvertError::Timeout { .. })));
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let state = AppState::new(ConversionConfig::default(), &ServerConfig::default());
        let value = state.bounded(async { Ok::<_, ConvertError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn server_defaults_listen_on_all_interfaces() {
        let c = ServerConfig::default();
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.port, 8000);
    }
}
