use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeleteCollectionBuilder, Distance, PointStruct,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    vectors_config,
};
use std::collections::HashMap;

use super::error::IndexError;

/// Payload key carrying the catalogue slug.
pub const PATTERN_ID_KEY: &str = "pattern_id";

/// Payload key carrying the fingerprint of the embedder that produced the vector.
pub const EMBEDDER_KEY: &str = "embedder";

/// A catalogue description ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternPoint {
    pub id: u64,
    pub pattern_id: String,
    pub embedder: String,
    pub vector: Vec<f32>,
}

/// A raw store hit. `score` is plain (not squared) Euclidean distance.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredHit {
    pub pattern_id: String,
    pub score: f32,
}

/// Stable point id for a pattern slug, so rebuilds overwrite instead of duplicating.
pub fn pattern_point_id(pattern_id: &str) -> u64 {
    let hash = blake3::hash(pattern_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Minimal collection interface the vector-backed index needs.
pub trait CollectionStore: Send + Sync {
    fn collection_exists(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<bool, IndexError>> + Send;

    fn point_count(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<u64, IndexError>> + Send;

    /// Width of the collection's vectors, `None` if it has no single unnamed vector.
    fn vector_size(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<Option<u64>, IndexError>> + Send;

    /// Embedder fingerprint stored with the points, `None` if no point carries one.
    fn stored_embedder(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, IndexError>> + Send;

    /// Drops the collection if present and creates it empty with Euclidean distance.
    fn recreate_collection(
        &self,
        collection: &str,
        dimension: u64,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    fn upsert(
        &self,
        collection: &str,
        points: Vec<PatternPoint>,
    ) -> impl std::future::Future<Output = Result<(), IndexError>> + Send;

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<Vec<StoredHit>, IndexError>> + Send;
}

#[derive(Clone)]
/// Qdrant-backed [`CollectionStore`].
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    pub fn connect(url: &str) -> Result<Self, IndexError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| IndexError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn health_check(&self) -> Result<(), IndexError> {
        self.client
            .health_check()
            .await
            .map_err(|e| IndexError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}

fn store_error(
    operation: &'static str,
    collection: &str,
) -> impl FnOnce(qdrant_client::QdrantError) -> IndexError {
    let collection = collection.to_string();
    move |e| IndexError::StoreFailed {
        operation,
        collection,
        message: e.to_string(),
    }
}

impl CollectionStore for QdrantStore {
    async fn collection_exists(&self, collection: &str) -> Result<bool, IndexError> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(store_error("exists", collection))
    }

    async fn point_count(&self, collection: &str) -> Result<u64, IndexError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(store_error("count", collection))?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn vector_size(&self, collection: &str) -> Result<Option<u64>, IndexError> {
        let response = self
            .client
            .collection_info(collection)
            .await
            .map_err(store_error("info", collection))?;

        let size = response
            .result
            .and_then(|info| info.config)
            .and_then(|config| config.params)
            .and_then(|params| params.vectors_config)
            .and_then(|vectors| vectors.config)
            .and_then(|config| match config {
                vectors_config::Config::Params(params) => Some(params.size),
                vectors_config::Config::ParamsMap(_) => None,
            });
        Ok(size)
    }

    async fn stored_embedder(&self, collection: &str) -> Result<Option<String>, IndexError> {
        let response = self
            .client
            .scroll(
                ScrollPointsBuilder::new(collection)
                    .limit(1)
                    .with_payload(true),
            )
            .await
            .map_err(store_error("scroll", collection))?;

        Ok(response.result.into_iter().next().and_then(|point| {
            point
                .payload
                .get(EMBEDDER_KEY)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        }))
    }

    async fn recreate_collection(&self, collection: &str, dimension: u64) -> Result<(), IndexError> {
        if self.collection_exists(collection).await? {
            self.client
                .delete_collection(DeleteCollectionBuilder::new(collection))
                .await
                .map_err(store_error("delete", collection))?;
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dimension, Distance::Euclid)),
            )
            .await
            .map_err(store_error("create", collection))?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PatternPoint>) -> Result<(), IndexError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert(PATTERN_ID_KEY.to_string(), p.pattern_id.into());
                payload.insert(EMBEDDER_KEY.to_string(), p.embedder.into());
                PointStruct::new(p.id, p.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(store_error("upsert", collection))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<StoredHit>, IndexError> {
        let response = self
            .client
            .search_points(SearchPointsBuilder::new(collection, vector, limit).with_payload(true))
            .await
            .map_err(store_error("search", collection))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let pattern_id = point
                    .payload
                    .get(PATTERN_ID_KEY)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())?;
                Some(StoredHit {
                    pattern_id,
                    score: point.score,
                })
            })
            .collect())
    }
}
