//! Confidence decision over index hits.
//!
//! A finding matches the catalogue when its nearest neighbour sits within the threshold
//! (inclusive). Anything further away is routed to generation, but the closest hit is still
//! reported so callers can see how near the miss was.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::debug;

use crate::catalogue::RiskPattern;
use crate::constants::DEFAULT_MATCH_THRESHOLD;
use crate::index::SearchHit;

/// Outcome of comparing the nearest hit against the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Matched pattern; only set when `is_confident`.
    pub pattern: Option<Arc<RiskPattern>>,
    /// Distance of the nearest hit, confident or not. `None` when the index returned nothing.
    pub distance: Option<f32>,
    pub is_confident: bool,
    /// Nearest pattern id even when not confident, for diagnostics.
    pub nearest_pattern_id: Option<String>,
}

impl MatchResult {
    pub fn none() -> Self {
        Self {
            pattern: None,
            distance: None,
            is_confident: false,
            nearest_pattern_id: None,
        }
    }

    pub fn pattern_id(&self) -> Option<&str> {
        self.pattern.as_ref().map(|p| p.id.as_str())
    }
}

/// Applies the distance threshold to the best hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchDecider {
    threshold: f32,
}

impl Default for MatchDecider {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl MatchDecider {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Decides on the first (nearest) hit. `hits` must be ordered by ascending distance.
    pub fn decide(&self, hits: &[SearchHit]) -> MatchResult {
        let Some(best) = hits.first() else {
            return MatchResult::none();
        };

        let is_confident = best.distance.is_finite() && best.distance <= self.threshold;
        debug!(
            pattern_id = %best.pattern.id,
            distance = best.distance,
            threshold = self.threshold,
            is_confident,
            "Match decision"
        );

        MatchResult {
            pattern: is_confident.then(|| Arc::clone(&best.pattern)),
            distance: Some(best.distance),
            is_confident,
            nearest_pattern_id: Some(best.pattern.id.clone()),
        }
    }
}
