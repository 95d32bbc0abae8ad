//! HTTP control surface using Axum

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::core::runtime::{TickOutcome, TradingRuntime};
use crate::error::TradingError;
use crate::metrics::Metrics;
use crate::models::session::StopReason;

#[derive(Clone)]
pub struct AppState {
    pub runtime: TradingRuntime,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
}

impl AppState {
    pub fn new(runtime: TradingRuntime) -> Self {
        Self {
            metrics: runtime.metrics(),
            runtime,
            start_time: Arc::new(Instant::now()),
        }
    }
}

/// Trading errors rendered as JSON with a status code per error kind.
pub struct ApiError(pub TradingError);

impl From<TradingError> for ApiError {
    fn from(e: TradingError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TradingError::SessionInactive => StatusCode::CONFLICT,
            TradingError::GatewayUnavailable { .. } => StatusCode::BAD_GATEWAY,
            TradingError::OrderRejected { .. } | TradingError::InsufficientData { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            TradingError::InvalidConfiguration(_) | TradingError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let uptime_seconds = state.start_time.elapsed().as_secs();
    let session_active = state.runtime.is_session_active().await;
    Json(json!({
        "status": "healthy",
        "uptime_seconds": uptime_seconds,
        "session_active": session_active,
        "service": "spotrix-trader"
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    state.metrics.http_requests_in_flight.dec();

    let status = response.status();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(start.elapsed().as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            "HTTP request error"
        );
    }

    response
}

async fn get_session(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let session = state
        .runtime
        .current_session()
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!(session)))
}

async fn get_position(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.runtime.position().await))
}

async fn start_session(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let session = state.runtime.start_session().await?;
    Ok(Json(json!(session)))
}

#[derive(Debug, Deserialize)]
struct StopSessionRequest {
    #[serde(default)]
    reason: Option<StopReason>,
}

async fn stop_session(
    State(state): State<AppState>,
    body: Option<Json<StopSessionRequest>>,
) -> Result<Json<Value>, ApiError> {
    // No body (or no JSON content type) means a manual stop.
    let reason = body
        .and_then(|Json(request)| request.reason)
        .unwrap_or(StopReason::Manual);
    let session = state.runtime.stop_session(reason).await?;
    Ok(Json(json!(session)))
}

async fn trigger_tick(State(state): State<AppState>) -> Result<Response, ApiError> {
    match state.runtime.tick().await? {
        TickOutcome::Completed(result) => Ok(Json(json!(result)).into_response()),
        TickOutcome::Skipped => Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "tick_in_flight",
                "message": "another tick is already running",
            })),
        )
            .into_response()),
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/session", get(get_session))
        .route("/api/session/start", post(start_session))
        .route("/api/session/stop", post(stop_session))
        .route("/api/position", get(get_position))
        .route("/api/tick", post(trigger_tick))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    axum::serve(listener, app).await
}
