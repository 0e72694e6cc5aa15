//! HTTP surface of the dashboard.

pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::core::dashboard::Dashboard;
use crate::utils::error::Result;

/// Build the dashboard router over a shared, read-only [`Dashboard`].
pub fn router(dashboard: Arc<Dashboard>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/options", get(handlers::options))
        .route("/api/summary", get(handlers::summary))
        .route("/api/map", get(handlers::map))
        .route("/api/charts", get(handlers::charts))
        .route("/api/top", get(handlers::top))
        .route("/api/table", get(handlers::table))
        .route("/api/export", get(handlers::export))
        .route("/api/report/summary", get(handlers::report_summary))
        .route("/report", get(handlers::report_inline))
        .route("/report/download", get(handlers::report_download))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(dashboard)
}

/// Serve until Ctrl-C.
pub async fn serve(dashboard: Arc<Dashboard>, listener: TcpListener) -> Result<()> {
    tracing::info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(dashboard))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
