//! Rental ROI API - rent and sale price prediction service
//!
//! Serves per-listing rent and sale price estimates and the derived
//! gross rental yield over HTTP, using in-process ONNX inference with
//! deterministic fallback formulas.

use anyhow::Result;
use roi_lib::{
    health::{components, HealthRegistry},
    models::Target,
    observability::RoiMetrics,
    predictor::Predictor,
    registry::ModelRegistry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = SERVICE_VERSION, "Starting roi-api");

    // Load configuration
    let config = config::ApiConfig::load()?;
    info!(port = config.port, model_dir = %config.model_dir, "Service configured");

    // Load model artifacts once; a missing model leaves its target in
    // fallback mode rather than failing startup
    let registry = Arc::new(ModelRegistry::new(&config.model_dir));
    registry.load();

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    for (target, component) in [
        (Target::Rent, components::RENT_MODEL),
        (Target::Price, components::PRICE_MODEL),
    ] {
        health_registry.register(component).await;
        if !registry.is_loaded(target) {
            health_registry
                .set_degraded(component, "model unavailable, serving fallback estimates")
                .await;
        }
    }

    // Initialize metrics
    let metrics = RoiMetrics::new();
    for target in Target::ALL {
        metrics.set_model_loaded(target.name(), registry.is_loaded(target));
    }

    // Create shared application state
    let predictor = Arc::new(Predictor::new(registry));
    let app_state = Arc::new(api::AppState::new(
        predictor,
        health_registry.clone(),
        metrics,
        config.api_key.clone(),
    ));

    // Mark service as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    tokio::spawn(api::serve(config.port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}
