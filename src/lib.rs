//! riskmap library crate (used by the server binary and integration tests).
//!
//! Classifies free-text audit findings against a catalogue of known risk patterns, each mapped
//! to controls in several compliance frameworks, and falls back to a generative model when no
//! pattern is close enough.
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`Classifier`], [`Classification`], [`ClassifyError`] - per-request orchestration
//! - [`Sanitizer`], [`RejectedInput`] - input cleaning and limits
//! - [`MatchDecider`], [`MatchResult`] - the confidence threshold
//! - [`ResilientModelClient`], [`RetryPolicy`] - retrying generative calls
//! - [`extract`] - JSON recovery from free-form replies
//! - [`ResultValidator`], [`RiskItem`], [`Provenance`] - record shape and labelling
//!
//! ## Catalogue & Index
//! - [`Catalogue`], [`RiskPattern`] - the framework crosswalk
//! - [`PatternEmbedder`], [`EmbedderConfig`] - sentence embeddings (BERT or stub)
//! - [`PatternIndex`], [`MemoryPatternIndex`], [`QdrantPatternIndex`], [`SharedIndex`]
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod audit;
pub mod catalogue;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod export;
pub mod extract;
pub mod gateway;
pub mod index;
pub mod llm;
pub mod matching;
pub mod pipeline;
pub mod sanitize;
pub mod validate;

pub use catalogue::{Catalogue, CatalogueError, RiskPattern};
pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use embedding::{EmbedderConfig, EmbeddingError, PatternEmbedder};
pub use extract::extract;
pub use index::{
    IndexBackend, IndexError, MemoryPatternIndex, PatternIndex, QdrantPatternIndex, SearchHit,
    SharedIndex,
};
#[cfg(any(test, feature = "mock"))]
pub use index::{MockCollectionStore, MockPatternIndex};
#[cfg(any(test, feature = "mock"))]
pub use llm::MockModel;
pub use llm::{
    GenaiModel, GenerativeModel, ModelCallFailed, ModelError, ResilientModelClient, RetryPolicy,
};
pub use matching::{MatchDecider, MatchResult};
pub use pipeline::{Classification, Classifier, ClassifyError};
pub use sanitize::{RejectedInput, Sanitizer};
pub use validate::{InvalidResultStructure, Provenance, ResultValidator, RiskItem};
