use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::catalogue::RiskPattern;
use crate::index::{MockPatternIndex, SearchHit};
use crate::llm::{MockModel, RetryPolicy};

const WRAPPED_REPLY: &str = "Here you go:\n{\"risks\":[{\"description\":\"x\",\"controlMapping\":{},\"recommendation\":\"y\"}]}\nEnjoy!";

fn backups_pattern() -> Arc<RiskPattern> {
    Arc::new(RiskPattern::new(
        "backups_not_tested",
        "Backups run nightly but restores are never tested",
        [
            ("iso_27001".to_string(), "A.8.13".to_string()),
            ("soc_2".to_string(), "A1.2".to_string()),
            ("nist_csf".to_string(), "PR.IP-4".to_string()),
        ],
    ))
}

fn hit(distance: f32) -> SearchHit {
    SearchHit {
        pattern: backups_pattern(),
        distance,
    }
}

fn pipeline_with(
    index: MockPatternIndex,
    model: Arc<MockModel>,
) -> Classifier<MockPatternIndex> {
    let policy = RetryPolicy::default();
    Classifier::new(
        SharedIndex::new(index),
        ResilientModelClient::new(model, policy),
    )
}

#[tokio::test]
async fn test_confident_match_returns_catalog_item_without_model() {
    let model = Arc::new(MockModel::replying(WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::with_hits(vec![hit(0.9)]), model.clone());

    let result = classifier
        .classify("Database backups haven't been tested in 14 months")
        .await
        .unwrap();

    assert!(result.match_result.is_confident);
    assert_eq!(result.match_result.pattern_id(), Some("backups_not_tested"));
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].provenance, Provenance::Catalog);
    assert_eq!(result.items[0].control_mapping, backups_pattern().controls);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_threshold_boundary_is_confident() {
    let model = Arc::new(MockModel::replying(WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::with_hits(vec![hit(1.4)]), model.clone());

    let result = classifier.classify("finding").await.unwrap();
    assert!(result.match_result.is_confident);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_distant_match_falls_back_to_model() {
    let model = Arc::new(MockModel::replying(WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::with_hits(vec![hit(1.8)]), model.clone());

    let result = classifier.classify("Coffee machine broken").await.unwrap();

    assert!(!result.match_result.is_confident);
    assert_eq!(result.match_result.distance, Some(1.8));
    assert_eq!(
        result.match_result.nearest_pattern_id.as_deref(),
        Some("backups_not_tested")
    );
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].provenance, Provenance::Generated);
    assert_eq!(result.items[0].description, "x");
    assert_eq!(result.items[0].recommendation, "y");
    assert!(result.items[0].control_mapping.is_empty());
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_empty_index_result_falls_back_to_model() {
    let model = Arc::new(MockModel::replying(WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::default(), model.clone());

    let result = classifier.classify("finding").await.unwrap();
    assert_eq!(result.match_result, MatchResult::none());
    assert_eq!(result.count(Provenance::Generated), 1);
}

#[tokio::test]
async fn test_prompt_carries_sanitized_text() {
    let model = Arc::new(MockModel::replying("[]"));
    let classifier = pipeline_with(MockPatternIndex::default(), model.clone());

    classifier.classify("  No MFA\u{0} on VPN\u{7f}  ").await.unwrap();

    let prompts = model.prompts();
    assert_eq!(prompts[0].0, SYSTEM_PROMPT);
    assert_eq!(prompts[0].1, user_prompt("No MFA on VPN"));
}

#[tokio::test]
async fn test_prose_only_reply_is_unparseable_with_raw_text() {
    let reply = "I could not identify any risks in this finding.";
    let model = Arc::new(MockModel::replying(reply));
    let classifier = pipeline_with(MockPatternIndex::default(), model.clone());

    let err = classifier.classify("finding").await.unwrap_err();

    assert!(matches!(err, ClassifyError::UnparseableResponse { .. }));
    assert_eq!(err.raw_response(), Some(reply));
    assert!(err.is_recoverable());
    assert_eq!(err.code(), "unparseable_response");
    // Formatting problems are not retried.
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_wrong_shape_is_invalid_structure_with_raw_text() {
    let reply = r#"{"risks": ["backups", "mfa"]}"#;
    let model = Arc::new(MockModel::replying(reply));
    let classifier = pipeline_with(MockPatternIndex::default(), model);

    let err = classifier.classify("finding").await.unwrap_err();

    assert!(matches!(
        err,
        ClassifyError::InvalidResultStructure {
            reason: crate::validate::InvalidResultStructure::NonObjectRecord { index: 0, .. },
            ..
        }
    ));
    assert_eq!(err.raw_response(), Some(reply));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_rejected_input_skips_index() {
    let index = MockPatternIndex::with_hits(vec![hit(0.1)]);
    let model = Arc::new(MockModel::replying("[]"));
    let classifier = pipeline_with(index, model.clone()).with_sanitizer(Sanitizer::new(5));

    let err = classifier.classify("far too long").await.unwrap_err();
    assert!(matches!(err, ClassifyError::RejectedInput(_)));
    assert!(err.is_recoverable());
    assert_eq!(classifier.index().current().searches(), 0);

    let err = classifier.classify(" \u{1} ").await.unwrap_err();
    assert!(matches!(err, ClassifyError::RejectedInput(_)));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_index_outage_is_fatal_and_skips_model() {
    let model = Arc::new(MockModel::replying(WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::failing("connection refused"), model.clone());

    let err = classifier.classify("finding").await.unwrap_err();
    assert!(matches!(err, ClassifyError::IndexUnavailable(_)));
    assert!(!err.is_recoverable());
    assert_eq!(err.raw_response(), None);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_model_outage_surfaces_after_retries() {
    let model = Arc::new(MockModel::failing());
    let classifier = pipeline_with(MockPatternIndex::default(), model.clone());

    let err = classifier.classify("finding").await.unwrap_err();
    match err {
        ClassifyError::ModelCallFailed(ref failed) => assert_eq!(failed.attempts, 3),
        ref other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_recoverable());
    assert_eq!(model.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_model_failures_recover() {
    let model = Arc::new(MockModel::failing_then(2, WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::default(), model.clone());

    let result = classifier.classify("finding").await.unwrap();
    assert_eq!(result.items.len(), 1);
    assert_eq!(model.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_audit_records_attempts_after_retries() {
    let (capture, subscriber) = crate::audit::tests::capturing_subscriber();
    let _guard = tracing::subscriber::set_default(subscriber);
    let model = Arc::new(MockModel::failing_then(2, WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::default(), model);

    classifier.classify("finding").await.unwrap();

    let replied = capture.lines_with("model replied");
    assert_eq!(replied.len(), 1);
    assert!(replied[0].contains(crate::audit::AUDIT_TARGET));
    assert!(replied[0].contains(" attempts=3"));
}

#[tokio::test(start_paused = true)]
async fn test_audit_records_attempts_on_model_outage() {
    let (capture, subscriber) = crate::audit::tests::capturing_subscriber();
    let _guard = tracing::subscriber::set_default(subscriber);
    let classifier = pipeline_with(MockPatternIndex::default(), Arc::new(MockModel::failing()));

    let err = classifier.classify("finding").await.unwrap_err();
    assert_eq!(err.attempts(), Some(3));

    let failed = capture.lines_with("classification failed");
    assert_eq!(failed.len(), 1);
    assert!(failed[0].contains("code=\"model_call_failed\""));
    assert!(failed[0].contains(" attempts=3"));
}

#[tokio::test]
async fn test_narrative_on_match_appends_generated_items() {
    let model = Arc::new(MockModel::replying(WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::with_hits(vec![hit(0.5)]), model.clone())
        .with_narrative_on_match(true);

    let result = classifier.classify("finding").await.unwrap();

    let provenances: Vec<_> = result.items.iter().map(|i| i.provenance).collect();
    assert_eq!(provenances, [Provenance::Catalog, Provenance::Generated]);
    assert_eq!(result.items[0].control_mapping, backups_pattern().controls);
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_narrative_failure_keeps_catalog_item() {
    let model = Arc::new(MockModel::replying("no json here"));
    let classifier = pipeline_with(MockPatternIndex::with_hits(vec![hit(0.5)]), model)
        .with_narrative_on_match(true);

    let result = classifier.classify("finding").await.unwrap();
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].provenance, Provenance::Catalog);
}

#[tokio::test]
async fn test_tighter_threshold_routes_to_model() {
    let model = Arc::new(MockModel::replying(WRAPPED_REPLY));
    let classifier = pipeline_with(MockPatternIndex::with_hits(vec![hit(1.2)]), model.clone())
        .with_decider(MatchDecider::new(1.0));

    let result = classifier.classify("finding").await.unwrap();
    assert!(!result.match_result.is_confident);
    assert_eq!(result.count(Provenance::Generated), 1);
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let model = Arc::new(MockModel::replying("[]"));
    let classifier = pipeline_with(MockPatternIndex::default(), model);

    let a = classifier.classify("one").await.unwrap();
    let b = classifier.classify("two").await.unwrap();
    assert_ne!(a.request_id, b.request_id);
}

#[test]
fn test_from_config_applies_tunables() {
    let config = Config {
        match_threshold: 0.8,
        top_k: 0,
        ..Config::default()
    };
    let classifier = Classifier::from_config(
        &config,
        SharedIndex::new(MockPatternIndex::default()),
        ResilientModelClient::new(
            Arc::new(MockModel::replying("[]")),
            RetryPolicy {
                attempt_timeout: Duration::from_secs(5),
                ..RetryPolicy::from_config(&config)
            },
        ),
    );
    assert_eq!(classifier.decider().threshold(), 0.8);
    assert_eq!(classifier.top_k, 1);
    assert_eq!(classifier.model().policy().attempt_timeout, Duration::from_secs(5));
}
