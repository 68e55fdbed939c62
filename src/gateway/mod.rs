//! HTTP gateway (Axum) for classification and report export.
//!
//! This module is primarily used by the `riskmap` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{classify_handler, export_handler};
pub use state::HandlerState;

use crate::index::PatternIndex;

/// Response header summarising how a request was served.
pub const RISKMAP_STATUS_HEADER: &str = "x-riskmap-status";

pub const STATUS_HEALTHY: &str = "healthy";
pub const STATUS_READY: &str = "ready";
pub const STATUS_NOT_READY: &str = "not_ready";

pub fn create_router_with_state<I>(state: HandlerState<I>) -> Router
where
    I: PatternIndex + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<I>))
        .route("/v1/classify", post(classify_handler::<I>))
        .route("/v1/export", post(export_handler::<I>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    pub http: &'static str,
    pub index: &'static str,
    pub index_backend: &'static str,
    pub embedder_mode: &'static str,
    pub patterns: usize,
    pub model: String,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        RISKMAP_STATUS_HEADER,
        HeaderValue::from_static(STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// Ready once the pattern index holds at least one pattern.
#[tracing::instrument(skip(state))]
pub async fn ready_handler<I>(State(state): State<HandlerState<I>>) -> Response
where
    I: PatternIndex + 'static,
{
    let patterns = state.classifier.index().len();
    let is_ready = patterns > 0;

    let components = ComponentStatus {
        http: STATUS_READY,
        index: if is_ready { STATUS_READY } else { STATUS_NOT_READY },
        index_backend: state.index_backend,
        embedder_mode: state.embedder_mode,
        patterns,
        model: state.classifier.model().model_name().to_string(),
    };

    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, STATUS_READY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, STATUS_NOT_READY)
    };

    let mut headers = HeaderMap::new();
    headers.insert(RISKMAP_STATUS_HEADER, HeaderValue::from_static(status_msg));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
