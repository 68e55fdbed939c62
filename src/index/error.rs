use thiserror::Error;

use crate::constants::DimValidationError;
use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
/// Errors returned while building or querying a pattern index.
pub enum IndexError {
    /// Text could not be embedded.
    #[error("failed to embed text: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Could not connect to the vector store.
    #[error("failed to connect to vector store at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// A collection operation failed.
    #[error("vector store operation '{operation}' on '{collection}' failed: {message}")]
    StoreFailed {
        /// What was attempted.
        operation: &'static str,
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// Query and catalogue embeddings disagree on width.
    #[error("embedding width does not match the index: {0}")]
    Dimension(#[from] DimValidationError),

    /// The blocking embedding task died.
    #[error("embedding worker failed: {0}")]
    Worker(String),

    /// The catalogue had no patterns to index.
    #[error("cannot build an index from an empty catalogue")]
    EmptyCatalogue,
}
