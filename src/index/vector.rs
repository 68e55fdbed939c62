use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::store::{CollectionStore, PatternPoint, QdrantStore, pattern_point_id};
use super::{IndexError, PatternIndex, SearchHit, embed_query, rank};
use crate::catalogue::Catalogue;
use crate::embedding::PatternEmbedder;

/// Pattern index persisted in a Qdrant collection.
pub type QdrantPatternIndex = VectorPatternIndex<QdrantStore>;

/// What an existing collection looks like next to the catalogue and embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectionState {
    Missing,
    Current,
    Stale(&'static str),
}

/// Pattern index persisted in a vector-store collection.
pub struct VectorPatternIndex<S: CollectionStore> {
    store: S,
    collection: String,
    embedder: Arc<PatternEmbedder>,
    catalogue: Arc<Catalogue>,
}

impl<S: CollectionStore> VectorPatternIndex<S> {
    /// Opens `collection`, (re)populating it from the catalogue when needed.
    ///
    /// An existing collection is reused when `force_rebuild` is false, its vector width
    /// matches the embedder, its point count equals the catalogue size, and its points were
    /// built by an embedder with the same fingerprint. Otherwise it is dropped and rebuilt.
    #[instrument(skip(store, embedder, catalogue))]
    pub async fn build(
        store: S,
        collection: &str,
        embedder: Arc<PatternEmbedder>,
        catalogue: Arc<Catalogue>,
        force_rebuild: bool,
    ) -> Result<Self, IndexError> {
        if catalogue.is_empty() {
            return Err(IndexError::EmptyCatalogue);
        }

        let expected = catalogue.len() as u64;
        let state = if force_rebuild {
            CollectionState::Missing
        } else {
            Self::inspect(&store, collection, &embedder, expected).await?
        };

        match state {
            CollectionState::Current => {
                info!(
                    collection,
                    patterns = expected,
                    embedder = embedder.fingerprint(),
                    "Reusing existing pattern collection"
                );
            }
            CollectionState::Stale(reason) => {
                warn!(
                    collection,
                    expected_patterns = expected,
                    embedder = embedder.fingerprint(),
                    reason,
                    "Collection out of sync, rebuilding"
                );
                Self::populate(&store, collection, &embedder, &catalogue).await?;
            }
            CollectionState::Missing => {
                Self::populate(&store, collection, &embedder, &catalogue).await?;
            }
        }

        Ok(Self {
            store,
            collection: collection.to_string(),
            embedder,
            catalogue,
        })
    }

    async fn inspect(
        store: &S,
        collection: &str,
        embedder: &PatternEmbedder,
        expected: u64,
    ) -> Result<CollectionState, IndexError> {
        if !store.collection_exists(collection).await? {
            return Ok(CollectionState::Missing);
        }
        if store.vector_size(collection).await? != Some(embedder.dimension() as u64) {
            return Ok(CollectionState::Stale("vector width differs from embedder"));
        }
        if store.point_count(collection).await? != expected {
            return Ok(CollectionState::Stale("point count differs from catalogue"));
        }
        if store.stored_embedder(collection).await?.as_deref() != Some(embedder.fingerprint()) {
            return Ok(CollectionState::Stale("built by a different embedder"));
        }
        Ok(CollectionState::Current)
    }

    async fn populate(
        store: &S,
        collection: &str,
        embedder: &Arc<PatternEmbedder>,
        catalogue: &Catalogue,
    ) -> Result<(), IndexError> {
        let descriptions: Vec<&str> = catalogue.iter().map(|p| p.description.as_str()).collect();
        let vectors = embedder.embed_batch(&descriptions)?;

        let points = catalogue
            .iter()
            .zip(vectors)
            .map(|(pattern, vector)| PatternPoint {
                id: pattern_point_id(&pattern.id),
                pattern_id: pattern.id.clone(),
                embedder: embedder.fingerprint().to_string(),
                vector,
            })
            .collect::<Vec<_>>();

        store
            .recreate_collection(collection, embedder.dimension() as u64)
            .await?;
        store.upsert(collection, points).await?;

        info!(
            collection,
            patterns = catalogue.len(),
            dimension = embedder.dimension(),
            embedder = embedder.fingerprint(),
            "Populated pattern collection"
        );
        Ok(())
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl QdrantPatternIndex {
    /// Connects to Qdrant at `url` and opens or rebuilds `collection`.
    pub async fn connect(
        url: &str,
        collection: &str,
        embedder: Arc<PatternEmbedder>,
        catalogue: Arc<Catalogue>,
        force_rebuild: bool,
    ) -> Result<Self, IndexError> {
        let store = QdrantStore::connect(url)?;
        store.health_check().await?;
        Self::build(store, collection, embedder, catalogue, force_rebuild).await
    }
}

impl<S: CollectionStore> PatternIndex for VectorPatternIndex<S> {
    #[instrument(skip(self, query), fields(query_len = query.len(), collection = %self.collection))]
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = embed_query(&self.embedder, query).await?;
        let stored = self
            .store
            .search(&self.collection, vector, k as u64)
            .await?;

        let mut hits = Vec::with_capacity(stored.len());
        for hit in stored {
            let Some(pattern) = self.catalogue.get(&hit.pattern_id) else {
                warn!(pattern_id = %hit.pattern_id, "Indexed pattern missing from catalogue, skipping");
                continue;
            };
            let order = self.catalogue.position(&pattern.id).unwrap_or(usize::MAX);
            hits.push((
                order,
                SearchHit {
                    pattern: Arc::clone(pattern),
                    distance: hit.score * hit.score,
                },
            ));
        }

        let hits = rank(hits, k);
        debug!(hits = hits.len(), "Vector index search complete");
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.catalogue.len()
    }
}
