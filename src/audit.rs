//! Metadata-only audit trail.
//!
//! Every event goes to the `riskmap::audit` target so operators can route it separately
//! (`RUST_LOG=riskmap::audit=info`). Events carry the request id, lengths, distances, counts and
//! outcome codes. Finding text, prompts and model replies never appear here.

use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::matching::MatchResult;

/// Target every audit event is emitted on.
pub const AUDIT_TARGET: &str = "riskmap::audit";

pub fn finding_received(request_id: Uuid, chars: usize) {
    info!(target: "riskmap::audit", %request_id, chars, "finding received");
}

pub fn match_decided(request_id: Uuid, result: &MatchResult) {
    info!(
        target: "riskmap::audit",
        %request_id,
        is_confident = result.is_confident,
        distance = result.distance,
        nearest_pattern_id = result.nearest_pattern_id.as_deref(),
        "match decided"
    );
}

pub fn model_invoked(request_id: Uuid, model: &str, attempts: u32, reply_chars: usize) {
    info!(
        target: "riskmap::audit",
        %request_id,
        model,
        attempts,
        reply_chars,
        "model replied"
    );
}

pub fn classified(
    request_id: Uuid,
    catalog_items: usize,
    generated_items: usize,
    elapsed: Duration,
) {
    info!(
        target: "riskmap::audit",
        %request_id,
        catalog_items,
        generated_items,
        elapsed_ms = elapsed.as_millis() as u64,
        "classification complete"
    );
}

/// `attempts` is set when the model was called and every attempt failed.
pub fn failed(
    request_id: Uuid,
    code: &'static str,
    recoverable: bool,
    attempts: Option<u32>,
    elapsed: Duration,
) {
    warn!(
        target: "riskmap::audit",
        %request_id,
        code,
        recoverable,
        attempts,
        elapsed_ms = elapsed.as_millis() as u64,
        "classification failed"
    );
}

pub fn exported(items: usize, bytes: usize) {
    info!(target: "riskmap::audit", items, bytes, "report exported");
}
