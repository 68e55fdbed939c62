use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use super::RISKMAP_STATUS_HEADER;
use crate::pipeline::ClassifyError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl GatewayError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::Classify(e) => {
                let status = match e {
                    ClassifyError::RejectedInput(_) => StatusCode::BAD_REQUEST,
                    ClassifyError::IndexUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    ClassifyError::ModelCallFailed(_)
                    | ClassifyError::UnparseableResponse { .. }
                    | ClassifyError::InvalidResultStructure { .. } => StatusCode::BAD_GATEWAY,
                };
                (status, e.code())
            }
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let raw = match &self {
            GatewayError::Classify(e) => e.raw_response().map(str::to_string),
            _ => None,
        };

        let mut headers = HeaderMap::new();
        headers.insert(RISKMAP_STATUS_HEADER, HeaderValue::from_static("error"));

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
            kind,
            raw,
        });

        (status, headers, body).into_response()
    }
}
