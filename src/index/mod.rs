//! Nearest-neighbour search over catalogue descriptions.
//!
//! Two backends implement [`PatternIndex`]:
//!
//! - [`MemoryPatternIndex`]: exact brute-force search, built in-process at startup.
//! - [`VectorPatternIndex`]: a Qdrant collection (Euclidean metric), reused across restarts when
//!   its point count still matches the catalogue.
//!
//! Both report **squared** Euclidean distance between unit vectors, so scores are comparable
//! with the match threshold regardless of backend. [`SharedIndex`] wraps either one so the
//! catalogue can be rebuilt and swapped in while requests keep flowing.

pub mod error;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod shared;
pub mod store;
pub mod vector;


pub use error::IndexError;
pub use memory::MemoryPatternIndex;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCollectionStore, MockPatternIndex};
pub use shared::SharedIndex;
pub use store::{CollectionStore, PatternPoint, QdrantStore, StoredHit};
pub use vector::{QdrantPatternIndex, VectorPatternIndex};

use std::sync::Arc;

use crate::catalogue::RiskPattern;

/// One nearest-neighbour result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub pattern: Arc<RiskPattern>,
    /// Squared Euclidean distance; lower is closer.
    pub distance: f32,
}

/// Read-only similarity search over the catalogue.
pub trait PatternIndex: Send + Sync {
    /// Returns up to `k` hits ordered by ascending distance.
    ///
    /// Equal distances keep catalogue order so results are deterministic.
    fn search(
        &self,
        query: &str,
        k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SearchHit>, IndexError>> + Send;

    /// Number of indexed patterns.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The backend selected at startup.
pub enum IndexBackend {
    Memory(MemoryPatternIndex),
    Qdrant(QdrantPatternIndex),
}

impl IndexBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Qdrant(_) => "qdrant",
        }
    }
}

impl PatternIndex for IndexBackend {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
        match self {
            Self::Memory(index) => index.search(query, k).await,
            Self::Qdrant(index) => index.search(query, k).await,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Memory(index) => index.len(),
            Self::Qdrant(index) => index.len(),
        }
    }
}

/// Sorts by distance, keeping insertion order among ties, and keeps the best `k`.
pub(crate) fn rank(mut hits: Vec<(usize, SearchHit)>, k: usize) -> Vec<SearchHit> {
    hits.sort_by(|(ia, a), (ib, b)| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(ia.cmp(ib))
    });
    hits.truncate(k);
    hits.into_iter().map(|(_, hit)| hit).collect()
}

/// Embeds on the blocking pool; model inference can take tens of milliseconds.
pub(crate) async fn embed_query(
    embedder: &Arc<crate::embedding::PatternEmbedder>,
    query: &str,
) -> Result<Vec<f32>, IndexError> {
    let embedder = Arc::clone(embedder);
    let query = query.to_string();
    tokio::task::spawn_blocking(move || embedder.embed(&query))
        .await
        .map_err(|e| IndexError::Worker(e.to_string()))?
        .map_err(IndexError::from)
}
