use super::*;
use serde_json::json;

fn validate(value: Value) -> Result<Vec<RiskItem>, InvalidResultStructure> {
    ResultValidator::default().validate(&value)
}

#[test]
fn test_wrapped_records() {
    let items = validate(json!({"risks": [{
        "description": "Shared admin account",
        "controlMapping": {"iso_27001": "A.5.16", "soc_2": "CC6.1"},
        "recommendation": "Issue named accounts"
    }]}))
    .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].description, "Shared admin account");
    assert_eq!(items[0].control_mapping["iso_27001"], "A.5.16");
    assert_eq!(items[0].control_mapping["soc_2"], "CC6.1");
    assert_eq!(items[0].recommendation, "Issue named accounts");
    assert_eq!(items[0].provenance, Provenance::Generated);
}

#[test]
fn test_bare_array() {
    let items = validate(json!([{"description": "a"}, {"description": "b"}])).unwrap();
    let descriptions: Vec<_> = items.iter().map(|i| i.description.as_str()).collect();
    assert_eq!(descriptions, ["a", "b"]);
}

#[test]
fn test_empty_batch_is_valid() {
    assert!(validate(json!({"risks": []})).unwrap().is_empty());
}

#[test]
fn test_missing_fields_get_placeholders() {
    let items = validate(json!([{}])).unwrap();
    assert_eq!(items[0].description, UNKNOWN_RISK);
    assert!(items[0].control_mapping.is_empty());
    assert_eq!(items[0].recommendation, NO_RECOMMENDATION);
}

#[test]
fn test_null_and_blank_fields_get_placeholders() {
    let items = validate(json!([{"description": null, "recommendation": "   "}])).unwrap();
    assert_eq!(items[0].description, UNKNOWN_RISK);
    assert_eq!(items[0].recommendation, NO_RECOMMENDATION);
}

#[test]
fn test_non_object_element_rejects_batch() {
    let err = validate(json!({"risks": [{"description": "ok"}, "oops"]})).unwrap_err();
    assert_eq!(
        err,
        InvalidResultStructure::NonObjectRecord {
            index: 1,
            found: "a string"
        }
    );
}

#[test]
fn test_object_without_results_field() {
    let err = validate(json!({"findings": []})).unwrap_err();
    assert!(matches!(
        err,
        InvalidResultStructure::MissingResultsField { ref field } if field == "risks"
    ));
}

#[test]
fn test_results_field_not_array() {
    let err = validate(json!({"risks": {"description": "x"}})).unwrap_err();
    assert_eq!(
        err,
        InvalidResultStructure::ResultsNotArray {
            field: "risks".to_string(),
            found: "an object"
        }
    );
}

#[test]
fn test_scalar_top_level_rejected() {
    assert_eq!(
        validate(json!("just text")).unwrap_err(),
        InvalidResultStructure::UnexpectedShape { found: "a string" }
    );
}

#[test]
fn test_custom_results_field() {
    let validator = ResultValidator::new("items");
    let items = validator.validate(&json!({"items": [{}]})).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(validator.results_field(), "items");
}

#[test]
fn test_snake_case_mapping_accepted() {
    let items = validate(json!([{"control_mapping": {"hipaa": "164.312(d)"}}])).unwrap();
    assert_eq!(items[0].control_mapping["hipaa"], "164.312(d)");
}

#[test]
fn test_legacy_flat_keys_folded() {
    let items = validate(json!([{
        "description": "No MFA",
        "iso_control": "A.8.5",
        "soc_2": "CC6.1",
        "nist_csf": "PR.AC-7"
    }]))
    .unwrap();

    let mapping = &items[0].control_mapping;
    assert_eq!(mapping["iso_27001"], "A.8.5");
    assert_eq!(mapping["soc_2"], "CC6.1");
    assert_eq!(mapping["nist_csf"], "PR.AC-7");
    assert!(!mapping.contains_key("iso_control"));
}

#[test]
fn test_explicit_iso_key_wins_over_legacy() {
    let items = validate(json!([{"iso_control": "A.9.1", "iso_27001": "A.8.5"}])).unwrap();
    assert_eq!(items[0].control_mapping["iso_27001"], "A.8.5");
}

#[test]
fn test_nested_mapping_ignores_flat_keys() {
    let items = validate(json!([{"controlMapping": {"soc_2": "CC7.1"}, "hipaa": "164.308"}]))
        .unwrap();
    assert_eq!(items[0].control_mapping.len(), 1);
}

#[test]
fn test_control_ids_stringified_and_nested_dropped() {
    let items = validate(json!([{"controlMapping": {
        "iso_27001": 8.13,
        "soc_2": ["CC6.1", "CC6.2"],
        "hipaa": {"rule": "164"},
        "nist_csf": null,
        "pci_dss": true
    }}]))
    .unwrap();

    let mapping = &items[0].control_mapping;
    assert_eq!(mapping["iso_27001"], "8.13");
    assert_eq!(mapping["pci_dss"], "true");
    assert!(!mapping.contains_key("soc_2"));
    assert!(!mapping.contains_key("hipaa"));
    assert!(!mapping.contains_key("nist_csf"));
}

#[test]
fn test_non_object_mapping_becomes_empty() {
    let items = validate(json!([{"controlMapping": "A.8.13"}])).unwrap();
    assert!(items[0].control_mapping.is_empty());
}

#[test]
fn test_non_string_description_kept_as_json_text() {
    let items = validate(json!([{"description": 42}])).unwrap();
    assert_eq!(items[0].description, "42");
}

#[test]
fn test_catalog_item_copies_pattern() {
    let pattern = RiskPattern::new(
        "backups_not_tested",
        "Backups are never restored",
        [
            ("iso_27001".to_string(), "A.8.13".to_string()),
            ("soc_2".to_string(), "A1.2".to_string()),
        ],
    );
    let item = RiskItem::from_pattern(&pattern);
    assert_eq!(item.provenance, Provenance::Catalog);
    assert_eq!(item.control_mapping, pattern.controls);
    assert_eq!(item.description, pattern.description);
}

#[test]
fn test_serialized_shape() {
    let item = validate(json!([{"controlMapping": {"soc_2": "CC6.1"}}])).unwrap().remove(0);
    assert_eq!(
        serde_json::to_value(&item).unwrap(),
        json!({
            "description": UNKNOWN_RISK,
            "controlMapping": {"soc_2": "CC6.1"},
            "recommendation": NO_RECOMMENDATION,
            "provenance": "GENERATED"
        })
    );
    assert_eq!(
        serde_json::to_value(Provenance::Catalog).unwrap(),
        json!("CATALOG")
    );
}
