use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{IndexError, PatternIndex, SearchHit, embed_query, rank};
use crate::catalogue::{Catalogue, RiskPattern};
use crate::constants::validate_embedding_dim;
use crate::embedding::{PatternEmbedder, squared_l2};

/// Exact in-process index. Catalogues are small, so a linear scan is fine.
pub struct MemoryPatternIndex {
    embedder: Arc<PatternEmbedder>,
    entries: Vec<(Arc<RiskPattern>, Vec<f32>)>,
}

impl std::fmt::Debug for MemoryPatternIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPatternIndex")
            .field("patterns", &self.entries.len())
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl MemoryPatternIndex {
    /// Embeds every catalogue description.
    pub fn build(
        embedder: Arc<PatternEmbedder>,
        catalogue: &Catalogue,
    ) -> Result<Self, IndexError> {
        if catalogue.is_empty() {
            return Err(IndexError::EmptyCatalogue);
        }

        let descriptions: Vec<&str> = catalogue.iter().map(|p| p.description.as_str()).collect();
        let vectors = embedder.embed_batch(&descriptions)?;

        let entries = catalogue.iter().cloned().zip(vectors).collect::<Vec<_>>();

        info!(
            patterns = entries.len(),
            dimension = embedder.dimension(),
            "Built in-memory pattern index"
        );

        Ok(Self { embedder, entries })
    }

    pub fn embedder(&self) -> &Arc<PatternEmbedder> {
        &self.embedder
    }
}

impl PatternIndex for MemoryPatternIndex {
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = embed_query(&self.embedder, query).await?;
        validate_embedding_dim(vector.len(), self.embedder.dimension())?;

        let scored = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (pattern, stored))| {
                (
                    i,
                    SearchHit {
                        pattern: Arc::clone(pattern),
                        distance: squared_l2(&vector, stored),
                    },
                )
            })
            .collect();

        let hits = rank(scored, k);
        debug!(
            hits = hits.len(),
            best = hits.first().map(|h| h.distance),
            "Memory index search complete"
        );
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
