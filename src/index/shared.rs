use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::{IndexError, PatternIndex, SearchHit};

/// Hot-swappable handle to the live index.
///
/// Each search pins the index that was current when it started, so a concurrent
/// [`replace`](Self::replace) never mixes two catalogues inside one request.
pub struct SharedIndex<I> {
    inner: Arc<RwLock<Arc<I>>>,
}

impl<I> Clone for SharedIndex<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: PatternIndex> SharedIndex<I> {
    pub fn new(index: I) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    /// Snapshot of the index currently serving.
    pub fn current(&self) -> Arc<I> {
        Arc::clone(&self.inner.read())
    }

    /// Installs a rebuilt index and returns the one it superseded.
    pub fn replace(&self, index: I) -> Arc<I> {
        let patterns = index.len();
        let previous = std::mem::replace(&mut *self.inner.write(), Arc::new(index));
        info!(
            patterns,
            previous_patterns = previous.len(),
            "Pattern index replaced"
        );
        previous
    }
}

impl<I: PatternIndex> PatternIndex for SharedIndex<I> {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let index = self.current();
        index.search(query, k).await
    }

    fn len(&self) -> usize {
        self.inner.read().len()
    }
}
