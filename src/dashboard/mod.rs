//! Web dashboard: four tabs plus a small JSON API

pub mod form;
pub mod handlers;
pub mod render;

use crate::context::AppContext;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Build the dashboard router over a loaded context
pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/predict",
            get(handlers::predict_form).post(handlers::predict_submit),
        )
        .route("/eda", get(handlers::eda))
        .route("/clusters", get(handlers::clusters))
        .route("/report", get(handlers::report))
        .route("/assets/:name", get(handlers::asset))
        .route("/api/predict", post(handlers::api_predict))
        .route("/api/health", get(handlers::api_health))
        .route("/api/metrics", get(handlers::api_metrics))
        .with_state(context)
}

/// Serve the dashboard until Ctrl-C
pub async fn serve(context: Arc<AppContext>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(address = %listener.local_addr()?, "Dashboard listening");

    axum::serve(listener, router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Dashboard server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
