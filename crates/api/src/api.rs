//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use roi_lib::{
    health::{ComponentStatus, HealthRegistry},
    models::{ListingRecord, Target},
    observability::RoiMetrics,
    predictor::{compose_roi, Estimate, Predictor},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub health_registry: HealthRegistry,
    pub metrics: RoiMetrics,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(
        predictor: Arc<Predictor>,
        health_registry: HealthRegistry,
        metrics: RoiMetrics,
        api_key: Option<String>,
    ) -> Self {
        Self {
            predictor,
            health_registry,
            metrics,
            api_key,
        }
    }
}

/// Service banner, kept stable for frontend reachability checks
async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Rental ROI API is up" }))
}

/// Run one estimate, recording latency, counters and a log line
fn timed_estimate(state: &AppState, listing: &ListingRecord, target: Target) -> Estimate {
    let start = Instant::now();
    let estimate = state.predictor.estimate(listing, target);
    let elapsed = start.elapsed();

    state
        .metrics
        .observe_prediction_latency(target.name(), elapsed.as_secs_f64());
    state
        .metrics
        .inc_predictions(target.name(), estimate.source());
    info!(
        target = target.name(),
        source = estimate.source(),
        value = estimate.value(),
        elapsed_us = elapsed.as_micros(),
        "Estimate served"
    );

    estimate
}

async fn predict_rent(
    State(state): State<Arc<AppState>>,
    Json(listing): Json<ListingRecord>,
) -> impl IntoResponse {
    let estimate = timed_estimate(&state, &listing, Target::Rent);
    Json(json!({ "predicted_rent": estimate.value() }))
}

async fn predict_price(
    State(state): State<Arc<AppState>>,
    Json(listing): Json<ListingRecord>,
) -> impl IntoResponse {
    let estimate = timed_estimate(&state, &listing, Target::Price);
    Json(json!({ "predicted_price": estimate.value() }))
}

async fn calculate_roi(
    State(state): State<Arc<AppState>>,
    Json(listing): Json<ListingRecord>,
) -> impl IntoResponse {
    let rent = timed_estimate(&state, &listing, Target::Rent);
    let price = timed_estimate(&state, &listing, Target::Price);
    Json(compose_roi(rent.value(), price.value()))
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Fallback mode is still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Reject prediction requests lacking the configured API key
async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = req
            .headers()
            .get("x-api-key")
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid or missing API key" })),
            )
                .into_response();
        }
    }
    next.run(req).await
}

/// Browser CORS support; preflight requests are answered directly
async fn cors_layer(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        apply_cors_headers(response.headers_mut());
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
    } else {
        let mut response = next.run(req).await;
        apply_cors_headers(response.headers_mut());
        response
    }
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, x-api-key"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let predictions = Router::new()
        .route("/predict_rent", post(predict_rent))
        .route("/predict_price", post(predict_price))
        .route("/calculate_roi", post(calculate_roi))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(root))
        .merge(predictions)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(cors_layer))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
