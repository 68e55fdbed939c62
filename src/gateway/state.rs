use std::sync::Arc;

use crate::index::{IndexBackend, PatternIndex};
use crate::pipeline::Classifier;

/// Shared state behind every route.
pub struct HandlerState<I: PatternIndex + 'static = IndexBackend> {
    pub classifier: Arc<Classifier<I>>,

    /// Export column order (the catalogue's framework columns).
    pub frameworks: Arc<[String]>,

    /// Reported by `/ready`: `memory` or `qdrant`.
    pub index_backend: &'static str,

    /// Reported by `/ready`: `model` or `stub`.
    pub embedder_mode: &'static str,
}

impl<I: PatternIndex + 'static> Clone for HandlerState<I> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            frameworks: Arc::clone(&self.frameworks),
            index_backend: self.index_backend,
            embedder_mode: self.embedder_mode,
        }
    }
}

impl<I: PatternIndex + 'static> HandlerState<I> {
    pub fn new(classifier: Classifier<I>, frameworks: Vec<String>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            frameworks: frameworks.into(),
            index_backend: "unknown",
            embedder_mode: "unknown",
        }
    }

    pub fn with_components(mut self, index_backend: &'static str, embedder_mode: &'static str) -> Self {
        self.index_backend = index_backend;
        self.embedder_mode = embedder_mode;
        self
    }
}
