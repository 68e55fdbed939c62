use std::path::PathBuf;

use crate::config::Config;
use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN};
use crate::embedding::error::EmbeddingError;

#[derive(Debug, Clone, PartialEq)]
/// Configuration for [`PatternEmbedder`](super::PatternEmbedder).
pub struct EmbedderConfig {
    /// Directory holding `config.json`, `model.safetensors` and `tokenizer.json`.
    /// `None` selects the lexical stub.
    pub model_dir: Option<PathBuf>,
    /// Token budget per text; longer inputs are truncated.
    pub max_seq_len: usize,
    /// Stub output dimension. Model dimension comes from the checkpoint.
    pub stub_dim: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            stub_dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl EmbedderConfig {
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self::default()
    }

    /// Derives the embedder settings from the service configuration.
    pub fn from_service_config(config: &Config) -> Self {
        Self {
            model_dir: config.embedder_path.clone(),
            ..Default::default()
        }
    }

    pub fn is_stub(&self) -> bool {
        self.model_dir.is_none()
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be positive".to_string(),
            });
        }
        if self.stub_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "stub_dim must be positive".to_string(),
            });
        }

        if let Some(dir) = &self.model_dir {
            for file in ["config.json", "model.safetensors", "tokenizer.json"] {
                let path = dir.join(file);
                if !path.exists() {
                    return Err(EmbeddingError::ModelNotFound { path });
                }
            }
        }
        Ok(())
    }
}
