//! Cross-cutting, shared constants.
//!
//! The pipeline's tunables (threshold, retry policy, input cap) have their defaults here so that
//! [`crate::config::Config`], the individual components, and the tests agree on one value.
//!
//! # Distance Scale
//!
//! Distances are squared Euclidean distances between L2-normalised embeddings, so they fall in
//! `[0, 4]` and relate to cosine similarity by `d = 2 - 2·cos`. The default match threshold of
//! `1.4` therefore accepts anything with cosine similarity of at least `0.3`.

/// Maximum accepted finding length, in characters.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 10_000;

/// Maximum squared-L2 distance for a catalogue match to count as confident.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 1.4;

/// Number of nearest neighbours requested per finding.
pub const DEFAULT_TOP_K: usize = 1;

/// Generative-model attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Exponential backoff base (`unit × base^attempt`).
pub const DEFAULT_BACKOFF_BASE: u32 = 2;

/// Backoff time unit in milliseconds.
pub const DEFAULT_BACKOFF_UNIT_MS: u64 = 1_000;

/// Per-attempt timeout for the generative model, in seconds.
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 120;

/// Embedding width of MiniLM-L6 sentence encoders.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Token cap for the sentence encoder.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Field holding the record list when the model wraps it in an object.
pub const DEFAULT_RESULTS_FIELD: &str = "risks";

/// Default generative model (served by a local Ollama instance).
pub const DEFAULT_LLM_MODEL: &str = "qwen3-coder:30b";

/// Default collection name for the pattern index.
pub const DEFAULT_COLLECTION_NAME: &str = "framework_crosswalk";

/// Error returned when an embedding width does not line up with the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// Called where query embeddings meet catalogue embeddings, so a swapped model shows up as an
/// error instead of as meaningless distances.
///
/// # Example
///
/// ```
/// use riskmap::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// validate_embedding_dim(384, DEFAULT_EMBEDDING_DIM).unwrap();
/// assert!(validate_embedding_dim(768, DEFAULT_EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_maps_to_cosine_floor() {
        let cos_floor = 1.0 - DEFAULT_MATCH_THRESHOLD / 2.0;
        assert!((cos_floor - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_validate_embedding_dim_match() {
        assert!(validate_embedding_dim(384, 384).is_ok());
    }

    #[test]
    fn test_validate_embedding_dim_mismatch() {
        assert_eq!(
            validate_embedding_dim(768, 384),
            Err(DimValidationError::DimensionMismatch {
                expected: 384,
                actual: 768
            })
        );
    }

    #[test]
    fn test_validate_embedding_dim_zero() {
        assert_eq!(
            validate_embedding_dim(0, 0),
            Err(DimValidationError::ZeroDimension)
        );
    }

    #[test]
    fn test_error_display() {
        let err = DimValidationError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("768"));
    }
}
