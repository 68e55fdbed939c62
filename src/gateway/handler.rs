use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument};

use super::RISKMAP_STATUS_HEADER;
use crate::audit;
use crate::export::{report_filename, to_csv};
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{ClassifyRequest, ClassifyResponse, ExportRequest};
use crate::gateway::state::HandlerState;
use crate::index::PatternIndex;

#[instrument(skip(state, request))]
pub async fn classify_handler<I>(
    State(state): State<HandlerState<I>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError>
where
    I: PatternIndex + 'static,
{
    let request: ClassifyRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    let classification = state.classifier.classify(&request.text).await?;
    let status = if classification.match_result.is_confident {
        "catalog"
    } else {
        "generated"
    };
    info!(
        request_id = %classification.request_id,
        items = classification.items.len(),
        status,
        "Finding classified"
    );

    let mut headers = HeaderMap::new();
    headers.insert(RISKMAP_STATUS_HEADER, HeaderValue::from_static(status));

    Ok((
        StatusCode::OK,
        headers,
        Json(ClassifyResponse::from(classification)),
    )
        .into_response())
}

#[instrument(skip(state, request))]
pub async fn export_handler<I>(
    State(state): State<HandlerState<I>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError>
where
    I: PatternIndex + 'static,
{
    let request: ExportRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid export payload: {}", e)))?;

    let body = to_csv(&request.items, &state.frameworks);
    let filename = report_filename(chrono::Utc::now());
    debug!(items = request.items.len(), %filename, "Rendering report");
    audit::exported(request.items.len(), body.len());

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| GatewayError::InternalError(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, headers, body).into_response())
}
