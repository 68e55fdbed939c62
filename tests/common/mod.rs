//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod harness;
pub mod http_client;

use std::path::PathBuf;
use std::sync::Arc;

use riskmap::catalogue::Catalogue;
use riskmap::embedding::PatternEmbedder;
use riskmap::index::{MemoryPatternIndex, SharedIndex};
use riskmap::llm::{MockModel, ResilientModelClient, RetryPolicy};
use riskmap::pipeline::Classifier;

/// The reply from the prose-wrapped fallback scenario.
pub const WRAPPED_REPLY: &str = "Here you go:\n{\"risks\":[{\"description\":\"x\",\"controlMapping\":{},\"recommendation\":\"y\"}]}\nEnjoy!";

/// A finding that paraphrases the `backups_not_tested` pattern.
pub const BACKUPS_FINDING: &str =
    "Database backups run nightly but haven't been tested in 14 months...";

/// A finding sharing no vocabulary with the catalogue.
pub const UNRELATED_FINDING: &str = "Coffee machine broken; kitchen sink leaking again.";

pub fn crosswalk_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("framework_crosswalk.csv")
}

pub fn bundled_catalogue() -> Arc<Catalogue> {
    Arc::new(Catalogue::from_csv_path(&crosswalk_path()).expect("bundled crosswalk should parse"))
}

pub fn stub_embedder() -> Arc<PatternEmbedder> {
    Arc::new(PatternEmbedder::stub())
}

pub fn memory_index(catalogue: &Catalogue) -> MemoryPatternIndex {
    MemoryPatternIndex::build(stub_embedder(), catalogue).expect("index should build")
}

/// Single-attempt policy so failing-model tests stay fast on a real clock.
pub fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 1,
        ..RetryPolicy::default()
    }
}

pub fn stub_classifier(model: Arc<MockModel>) -> Classifier<MemoryPatternIndex> {
    let catalogue = bundled_catalogue();
    Classifier::new(
        SharedIndex::new(memory_index(&catalogue)),
        ResilientModelClient::new(model, quick_policy()),
    )
}
