//! Per-request classification: sanitize, search, decide, and fall back to the model.
//!
//! ```text
//! raw ──► Sanitizer ──► PatternIndex ──► MatchDecider ──┬─► confident: CATALOG item
//!                                                       └─► otherwise: model ─► extract ─► validate
//! ```
//!
//! Stages run one after another. A confident match never asks the model for control
//! identifiers; with `narrative_on_match` the model is still consulted, and its records are
//! appended as separate `GENERATED` items after the catalogue item.

mod error;

#[cfg(test)]
mod tests;

pub use error::ClassifyError;

use std::time::Instant;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::audit;
use crate::config::Config;
use crate::extract::extract;
use crate::index::{IndexBackend, PatternIndex, SharedIndex};
use crate::llm::{ResilientModelClient, SYSTEM_PROMPT, user_prompt};
use crate::matching::{MatchDecider, MatchResult};
use crate::sanitize::Sanitizer;
use crate::validate::{Provenance, ResultValidator, RiskItem};

/// Result of one classification.
#[derive(Debug, Clone)]
pub struct Classification {
    pub request_id: Uuid,
    pub match_result: MatchResult,
    /// The catalogue item (if any) first, then generated items in model order.
    pub items: Vec<RiskItem>,
}

impl Classification {
    pub fn count(&self, provenance: Provenance) -> usize {
        self.items
            .iter()
            .filter(|item| item.provenance == provenance)
            .count()
    }
}

/// Runs the retrieval-and-fallback pipeline.
pub struct Classifier<I = IndexBackend> {
    index: SharedIndex<I>,
    sanitizer: Sanitizer,
    decider: MatchDecider,
    model: ResilientModelClient,
    validator: ResultValidator,
    top_k: usize,
    narrative_on_match: bool,
}

impl<I: PatternIndex> Classifier<I> {
    /// Classifier with default sanitizer, threshold and validator.
    pub fn new(index: SharedIndex<I>, model: ResilientModelClient) -> Self {
        Self {
            index,
            sanitizer: Sanitizer::default(),
            decider: MatchDecider::default(),
            model,
            validator: ResultValidator::default(),
            top_k: crate::constants::DEFAULT_TOP_K,
            narrative_on_match: false,
        }
    }

    pub fn from_config(
        config: &Config,
        index: SharedIndex<I>,
        model: ResilientModelClient,
    ) -> Self {
        Self::new(index, model)
            .with_sanitizer(Sanitizer::new(config.max_input_length))
            .with_decider(MatchDecider::new(config.match_threshold))
            .with_top_k(config.top_k)
            .with_narrative_on_match(config.narrative_on_match)
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_decider(mut self, decider: MatchDecider) -> Self {
        self.decider = decider;
        self
    }

    pub fn with_validator(mut self, validator: ResultValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Neighbours requested per lookup; clamped to at least one.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_narrative_on_match(mut self, enabled: bool) -> Self {
        self.narrative_on_match = enabled;
        self
    }

    pub fn index(&self) -> &SharedIndex<I> {
        &self.index
    }

    pub fn decider(&self) -> &MatchDecider {
        &self.decider
    }

    pub fn model(&self) -> &ResilientModelClient {
        &self.model
    }

    /// Classifies one finding.
    ///
    /// The finding text is never logged; audit events carry only the request id and metadata.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty))]
    pub async fn classify(&self, raw: &str) -> Result<Classification, ClassifyError> {
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        let started = Instant::now();
        audit::finding_received(request_id, raw.chars().count());

        let outcome = self.run(request_id, raw).await;
        match &outcome {
            Ok(classification) => audit::classified(
                request_id,
                classification.count(Provenance::Catalog),
                classification.count(Provenance::Generated),
                started.elapsed(),
            ),
            Err(e) => audit::failed(
                request_id,
                e.code(),
                e.is_recoverable(),
                e.attempts(),
                started.elapsed(),
            ),
        }
        outcome
    }

    async fn run(&self, request_id: Uuid, raw: &str) -> Result<Classification, ClassifyError> {
        let text = self.sanitizer.sanitize(raw)?;

        let hits = self.index.search(&text, self.top_k).await?;
        let match_result = self.decider.decide(&hits);
        audit::match_decided(request_id, &match_result);

        let items = match &match_result.pattern {
            Some(pattern) if !self.narrative_on_match => {
                debug!(pattern_id = %pattern.id, "Confident catalogue match, model not consulted");
                vec![RiskItem::from_pattern(pattern)]
            }
            Some(pattern) => {
                let mut items = vec![RiskItem::from_pattern(pattern)];
                match self.generate(request_id, &text).await {
                    Ok(generated) => items.extend(generated),
                    Err(e) => warn!(
                        code = e.code(),
                        error = %e,
                        "Narrative generation failed, returning the catalogue match alone"
                    ),
                }
                items
            }
            None => self.generate(request_id, &text).await?,
        };

        Ok(Classification {
            request_id,
            match_result,
            items,
        })
    }

    async fn generate(&self, request_id: Uuid, text: &str) -> Result<Vec<RiskItem>, ClassifyError> {
        let reply = self.model.invoke(SYSTEM_PROMPT, &user_prompt(text)).await?;
        audit::model_invoked(
            request_id,
            self.model.model_name(),
            reply.attempts,
            reply.text.chars().count(),
        );
        let raw = reply.text;

        let Some(value) = extract(&raw) else {
            debug!(reply_len = raw.len(), "No JSON recovered from model reply");
            return Err(ClassifyError::UnparseableResponse { raw });
        };

        self.validator
            .validate(&value)
            .map_err(|reason| ClassifyError::InvalidResultStructure { raw, reason })
    }
}
