use super::*;

fn hit(id: &str, distance: f32) -> SearchHit {
    SearchHit {
        pattern: Arc::new(RiskPattern::new(
            id,
            "description",
            [("iso_27001".to_string(), "A.1".to_string())],
        )),
        distance,
    }
}

#[test]
fn test_within_threshold_is_confident() {
    let result = MatchDecider::default().decide(&[hit("backups_not_tested", 0.88)]);

    assert!(result.is_confident);
    assert_eq!(result.pattern_id(), Some("backups_not_tested"));
    assert_eq!(result.distance, Some(0.88));
}

#[test]
fn test_threshold_is_inclusive() {
    let result = MatchDecider::new(1.4).decide(&[hit("p", 1.4)]);
    assert!(result.is_confident);
}

#[test]
fn test_beyond_threshold_is_not_confident() {
    let result = MatchDecider::new(1.4).decide(&[hit("p", 1.400_001)]);

    assert!(!result.is_confident);
    assert!(result.pattern.is_none());
    assert_eq!(result.distance, Some(1.400_001));
    assert_eq!(result.nearest_pattern_id.as_deref(), Some("p"));
}

#[test]
fn test_only_first_hit_counts() {
    let result = MatchDecider::new(1.0).decide(&[hit("far", 1.5), hit("near", 0.1)]);
    assert!(!result.is_confident);
    assert_eq!(result.nearest_pattern_id.as_deref(), Some("far"));
}

#[test]
fn test_no_hits() {
    let result = MatchDecider::default().decide(&[]);
    assert_eq!(result, MatchResult::none());
    assert!(!result.is_confident);
}

#[test]
fn test_nan_distance_is_not_confident() {
    let result = MatchDecider::default().decide(&[hit("p", f32::NAN)]);
    assert!(!result.is_confident);
}

#[test]
fn test_zero_threshold_only_accepts_exact() {
    let decider = MatchDecider::new(0.0);
    assert!(decider.decide(&[hit("p", 0.0)]).is_confident);
    assert!(!decider.decide(&[hit("p", 0.01)]).is_confident);
}

#[test]
fn test_tightening_threshold_flips_borderline_only() {
    let hits_far = [hit("p", 1.2)];
    let hits_near = [hit("p", 0.4)];

    assert!(MatchDecider::new(1.4).decide(&hits_far).is_confident);
    assert!(!MatchDecider::new(1.0).decide(&hits_far).is_confident);
    assert!(MatchDecider::new(1.0).decide(&hits_near).is_confident);
}
