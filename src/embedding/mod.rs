//! Sentence embeddings for catalogue descriptions and findings.
//!
//! [`PatternEmbedder`] runs a BERT-family encoder through candle when a model directory is
//! configured. Without one it falls back to a hashed bag-of-words stub: deterministic, lexical,
//! and good enough for tests and demos where overlapping vocabulary should mean similarity.

/// Mean-pooled BERT encoder.
pub mod bert;
/// Embedder configuration.
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Tokenizer loading helpers.
pub mod utils;


pub use config::EmbedderConfig;
pub use error::EmbeddingError;

use std::path::Path;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use bert::BertEncoder;
use device::select_device;
use utils::load_tokenizer_with_truncation;

enum EmbedderBackend {
    Model {
        encoder: BertEncoder,
        tokenizer: Box<Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Produces unit-length embeddings; the same instance must embed both catalogue and queries.
pub struct PatternEmbedder {
    backend: EmbedderBackend,
    dimension: usize,
    fingerprint: String,
}

impl std::fmt::Debug for PatternEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("dimension", &self.dimension)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

impl PatternEmbedder {
    pub fn load(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let Some(model_dir) = &config.model_dir else {
            warn!("No embedder model configured, using lexical STUB embeddings");
            return Ok(Self::stub_with_dim(config.stub_dim));
        };

        let device = select_device();
        debug!(?device, "Selected compute device for pattern embedder");

        let encoder =
            BertEncoder::load(model_dir, &device).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load encoder: {}", e),
            })?;
        let tokenizer = load_tokenizer_with_truncation(model_dir, config.max_seq_len)?;
        let dimension = encoder.hidden_size();

        info!(
            model_dir = %model_dir.display(),
            dimension,
            max_seq_len = config.max_seq_len,
            "Pattern embedder loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                encoder,
                tokenizer: Box::new(tokenizer),
                device,
            },
            dimension,
            fingerprint: model_fingerprint(model_dir, dimension),
        })
    }

    /// Lexical stub at the default dimension.
    pub fn stub() -> Self {
        Self::stub_with_dim(crate::constants::DEFAULT_EMBEDDING_DIM)
    }

    /// Lexical stub producing `dimension`-wide vectors.
    pub fn stub_with_dim(dimension: usize) -> Self {
        Self {
            backend: EmbedderBackend::Stub,
            dimension,
            fingerprint: format!("stub-blake3/{}", dimension),
        }
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let raw = match &self.backend {
            EmbedderBackend::Model {
                encoder,
                tokenizer,
                device,
            } => Self::embed_with_model(text, encoder, tokenizer, device)?,
            EmbedderBackend::Stub => self.embed_stub(text),
        };
        Ok(normalize(raw))
    }

    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Identifies the vector space this embedder produces.
    ///
    /// Vectors from embedders with different fingerprints are not comparable.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn embed_with_model(
        text: &str,
        encoder: &BertEncoder,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Err(EmbeddingError::TokenizationFailed {
                reason: "text produced no tokens".to_string(),
            });
        }

        debug!(
            text_len = text.len(),
            token_count = ids.len(),
            "Encoding text"
        );

        let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let pooled = encoder.encode(&input_ids, &type_ids, &mask)?;
        Ok(pooled.to_vec1::<f32>()?)
    }

    /// Hashed bag of lowercase alphanumeric tokens.
    ///
    /// Tokens are bucketed with blake3, so stored stub vectors stay valid across toolchains.
    /// Text with no tokens at all gets a seeded pseudo-random vector, which sits far from
    /// every real description instead of equidistant at the origin.
    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut any = false;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket =
                (stable_hash(token.to_lowercase().as_bytes()) % self.dimension as u64) as usize;
            embedding[bucket] += 1.0;
            any = true;
        }

        if !any {
            let mut state = stable_hash(text.as_bytes());
            for value in &mut embedding {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                *value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            }
        }

        embedding
    }
}

fn stable_hash(bytes: &[u8]) -> u64 {
    let hash = blake3::hash(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

fn model_fingerprint(model_dir: &Path, dimension: usize) -> String {
    format!("bert:{}/{}", model_dir.display(), dimension)
}

fn normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }
    embedding
}

/// Squared Euclidean distance. For unit vectors this is `2 - 2·cos`, in `[0, 4]`.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
