use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use super::store::{CollectionStore, PatternPoint, StoredHit};
use super::{IndexError, PatternIndex, SearchHit};
use crate::embedding::squared_l2;

#[derive(Default)]
struct MockCollection {
    dimension: u64,
    points: HashMap<u64, PatternPoint>,
}

/// In-memory [`CollectionStore`] that behaves like a Euclidean Qdrant collection.
#[derive(Default)]
pub struct MockCollectionStore {
    collections: RwLock<HashMap<String, MockCollection>>,
    recreations: AtomicUsize,
}

impl MockCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a collection was (re)created.
    pub fn recreations(&self) -> usize {
        self.recreations.load(Ordering::SeqCst)
    }

    /// Stamps every stored point with `embedder`, as if another embedder had built them.
    pub fn restamp(&self, collection: &str, embedder: &str) {
        if let Some(coll) = self.collections.write().get_mut(collection) {
            for point in coll.points.values_mut() {
                point.embedder = embedder.to_string();
            }
        }
    }

    /// Drops points until `keep` remain, simulating a stale collection.
    pub fn truncate(&self, collection: &str, keep: usize) {
        if let Some(coll) = self.collections.write().get_mut(collection) {
            let extra: Vec<u64> = coll.points.keys().skip(keep).copied().collect();
            for id in extra {
                coll.points.remove(&id);
            }
        }
    }
}

impl CollectionStore for MockCollectionStore {
    async fn collection_exists(&self, collection: &str) -> Result<bool, IndexError> {
        Ok(self.collections.read().contains_key(collection))
    }

    async fn point_count(&self, collection: &str) -> Result<u64, IndexError> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.points.len() as u64)
            .ok_or_else(|| IndexError::StoreFailed {
                operation: "count",
                collection: collection.to_string(),
                message: "collection not found".to_string(),
            })
    }

    async fn vector_size(&self, collection: &str) -> Result<Option<u64>, IndexError> {
        Ok(self.collections.read().get(collection).map(|c| c.dimension))
    }

    async fn stored_embedder(&self, collection: &str) -> Result<Option<String>, IndexError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|c| c.points.values().next())
            .map(|p| p.embedder.clone()))
    }

    async fn recreate_collection(&self, collection: &str, dimension: u64) -> Result<(), IndexError> {
        self.recreations.fetch_add(1, Ordering::SeqCst);
        self.collections.write().insert(
            collection.to_string(),
            MockCollection {
                dimension,
                points: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PatternPoint>) -> Result<(), IndexError> {
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| IndexError::StoreFailed {
                operation: "upsert",
                collection: collection.to_string(),
                message: "collection not found".to_string(),
            })?;

        for point in points {
            crate::constants::validate_embedding_dim(point.vector.len(), coll.dimension as usize)?;
            coll.points.insert(point.id, point);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<StoredHit>, IndexError> {
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| IndexError::StoreFailed {
                operation: "search",
                collection: collection.to_string(),
                message: "collection not found".to_string(),
            })?;

        let mut hits: Vec<StoredHit> = coll
            .points
            .values()
            .map(|p| StoredHit {
                pattern_id: p.pattern_id.clone(),
                score: squared_l2(&vector, &p.vector).sqrt(),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit as usize);
        Ok(hits)
    }
}

/// Scripted [`PatternIndex`] for pipeline tests.
#[derive(Default)]
pub struct MockPatternIndex {
    hits: Mutex<Vec<SearchHit>>,
    fail_with: Mutex<Option<String>>,
    searches: AtomicUsize,
}

impl MockPatternIndex {
    /// Always returns `hits` (already ordered), truncated to `k`.
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: Mutex::new(hits),
            ..Default::default()
        }
    }

    /// Every search fails as a store outage.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Mutex::new(Some(message.to_string())),
            ..Default::default()
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl PatternIndex for MockPatternIndex {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(IndexError::StoreFailed {
                operation: "search",
                collection: "mock".to_string(),
                message,
            });
        }
        Ok(self.hits.lock().iter().take(k).cloned().collect())
    }

    fn len(&self) -> usize {
        self.hits.lock().len()
    }
}
