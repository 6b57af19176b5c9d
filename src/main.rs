//! Diabetes Risk Dashboard - Main Entry Point
//!
//! Loads the fitted artifacts once, then serves the dashboard and JSON API.
//! Usage: `diabetes-risk [config.toml]`

use anyhow::Result;
use diabetes_risk::{
    config::{AppConfig, LoggingConfig},
    context::AppContext,
    dashboard,
    metrics::MetricsReporter,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(&path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Starting Diabetes Risk Dashboard");
    info!(
        scaler = %config.artifacts.scaler_path.display(),
        model = %config.artifacts.model_path.display(),
        zero_policy = ?config.validation.zero_policy,
        "Configuration loaded successfully"
    );

    // Load artifacts; absent ones degrade the dashboard instead of stopping it
    let context = Arc::new(AppContext::load(config));
    if !context.inference_available() {
        warn!(
            missing = ?context.artifacts.inference_blockers(),
            "Prediction disabled until the artifacts are restored"
        );
    }

    // Start metrics reporter
    let interval_secs = context.config.metrics.report_interval_secs;
    if interval_secs > 0 {
        let reporter = MetricsReporter::new(context.metrics.clone(), interval_secs);
        tokio::spawn(reporter.start());
    }

    let bind = context.config.server.bind.clone();
    dashboard::serve(context.clone(), &bind).await?;

    // Print final summary
    info!("Dashboard shutting down...");
    context.metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
