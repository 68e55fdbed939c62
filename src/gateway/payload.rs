use serde::{Deserialize, Serialize};

use crate::matching::MatchResult;
use crate::pipeline::Classification;
use crate::validate::RiskItem;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchPayload {
    pub pattern_id: Option<String>,
    pub distance: Option<f32>,
    pub is_confident: bool,
    pub nearest_pattern_id: Option<String>,
}

impl From<&MatchResult> for MatchPayload {
    fn from(result: &MatchResult) -> Self {
        Self {
            pattern_id: result.pattern_id().map(str::to_string),
            distance: result.distance,
            is_confident: result.is_confident,
            nearest_pattern_id: result.nearest_pattern_id.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub request_id: String,
    #[serde(rename = "match")]
    pub match_info: MatchPayload,
    pub items: Vec<RiskItem>,
}

impl From<Classification> for ClassifyResponse {
    fn from(classification: Classification) -> Self {
        Self {
            request_id: classification.request_id.to_string(),
            match_info: MatchPayload::from(&classification.match_result),
            items: classification.items,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExportRequest {
    pub items: Vec<RiskItem>,
}
