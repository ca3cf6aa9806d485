//! HTTP transport for the advisor service
//!
//! Axum router exposing the recommendation form and the image upload as JSON
//! endpoints. Health is plain text; info and metrics are plain JSON.

use axum::{
    Form, Json, Router,
    body::{Body, Bytes},
    extract::{
        DefaultBodyLimit, State,
        rejection::{BytesRejection, FormRejection, JsonRejection},
    },
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    advisor::Advisor,
    config::Config,
    diagnosis,
    error::{AgriError, Result},
    models::{Diagnosis, FormInput, Recommendation},
};

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub advisor: Arc<dyn Advisor>,
    pub metrics: Arc<Mutex<HttpMetrics>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Metrics for HTTP server
#[derive(Debug, Clone, Default)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub errors_total: u64,
    pub last_request_unix: u64,
    pub latencies: Vec<f64>, // ring buffer, last 256
}

const LATENCY_WINDOW: usize = 256;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

impl HttpState {
    pub fn new(config: Config, advisor: Arc<dyn Advisor>) -> Self {
        Self {
            config: Arc::new(config),
            advisor,
            metrics: Arc::new(Mutex::new(HttpMetrics::default())),
            started_at: chrono::Utc::now(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "advisor": state.advisor.name(),
        "bind": state.config.server.bind.to_string(),
        "max_image_bytes": state.config.server.max_image_bytes,
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// Metrics endpoint
pub async fn metrics_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let metrics = state.metrics.lock().await.clone();
    let avg_latency_ms = if metrics.latencies.is_empty() {
        None
    } else {
        Some(metrics.latencies.iter().sum::<f64>() / metrics.latencies.len() as f64)
    };
    Json(json!({
        "total_requests": metrics.total_requests,
        "errors_total": metrics.errors_total,
        "last_request_unix": metrics.last_request_unix,
        "avg_latency_ms": avg_latency_ms,
    }))
}

async fn run_advisor(state: &HttpState, input: FormInput) -> Result<Json<RecommendationsResponse>> {
    let timeout_ms = state.config.advisor.timeout_ms;
    let recommendations = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        state.advisor.recommend(&input),
    )
    .await
    .map_err(|_| AgriError::Timeout {
        operation: format!("{} advisor", state.advisor.name()),
        timeout_ms,
    })??;

    tracing::debug!(
        "Returning {} recommendation(s) from {} advisor",
        recommendations.len(),
        state.advisor.name()
    );
    Ok(Json(RecommendationsResponse { recommendations }))
}

/// JSON form submission
pub async fn recommendations_handler(
    State(state): State<HttpState>,
    payload: std::result::Result<Json<FormInput>, JsonRejection>,
) -> Result<Json<RecommendationsResponse>> {
    let Json(input) = payload.map_err(|e| AgriError::validation(e.body_text()))?;
    run_advisor(&state, input).await
}

/// URL-encoded form submission
pub async fn form_handler(
    State(state): State<HttpState>,
    payload: std::result::Result<Form<FormInput>, FormRejection>,
) -> Result<Json<RecommendationsResponse>> {
    let Form(input) = payload.map_err(|e| AgriError::validation(e.body_text()))?;
    run_advisor(&state, input).await
}

/// Raw image upload
pub async fn diagnose_handler(
    State(state): State<HttpState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<Diagnosis>> {
    let limit = state.config.server.max_image_bytes;
    let body = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AgriError::PayloadTooLarge { limit }
        } else {
            AgriError::validation(e.body_text())
        }
    })?;
    Ok(Json(diagnosis::diagnose(&body, limit)?))
}

async fn track_metrics(
    State(metrics): State<Arc<Mutex<HttpMetrics>>>,
    req: axum::http::Request<Body>,
    next: middleware::Next,
) -> axum::response::Response {
    let start = std::time::Instant::now();
    let resp = next.run(req).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mut m = metrics.lock().await;
    m.latencies.push(latency_ms);
    if m.latencies.len() > LATENCY_WINDOW {
        m.latencies.remove(0);
    }
    if !resp.status().is_success() {
        m.errors_total = m.errors_total.saturating_add(1);
    }
    m.total_requests = m.total_requests.saturating_add(1);
    m.last_request_unix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    resp
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        json!({"error": {"code": 404, "message": "Not found"}}).to_string(),
    )
}

/// Build the application router
pub fn router(state: HttpState) -> Router {
    let image_limit = state.config.server.max_image_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/recommendations", post(recommendations_handler))
        .route("/recommend", post(form_handler))
        .route(
            "/api/diagnose",
            post(diagnose_handler).layer(DefaultBodyLimit::max(image_limit)),
        )
        .fallback(not_found)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(config: Config, advisor: Arc<dyn Advisor>) -> Result<()> {
    let bind = config.server.bind;
    let state = HttpState::new(config, advisor);
    let advisor_name = state.advisor.name().to_string();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!(
        "Starting HTTP server on {} (advisor: {})",
        bind,
        advisor_name
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
