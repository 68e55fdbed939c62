//! Tabular report export.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::catalogue::csv::write_record;
use crate::validate::{Provenance, RiskItem};

/// Columns before the framework columns.
const LEADING_COLUMNS: [&str; 1] = ["description"];
/// Columns after the framework columns.
const TRAILING_COLUMNS: [&str; 2] = ["recommendation", "provenance"];

/// Renders `items` as CSV with one column per framework.
///
/// Frameworks listed in `preferred` come first, in that order; any other framework seen in
/// the items follows alphabetically. An item without an identifier for a framework gets an
/// empty cell.
pub fn to_csv(items: &[RiskItem], preferred: &[String]) -> String {
    let frameworks = framework_columns(items, preferred);

    let mut out = String::new();
    let header: Vec<&str> = LEADING_COLUMNS
        .iter()
        .copied()
        .chain(frameworks.iter().map(String::as_str))
        .chain(TRAILING_COLUMNS.iter().copied())
        .collect();
    write_record(&mut out, &header);

    for item in items {
        let mut row: Vec<&str> = Vec::with_capacity(header.len());
        row.push(&item.description);
        for framework in &frameworks {
            row.push(
                item.control_mapping
                    .get(framework)
                    .map(String::as_str)
                    .unwrap_or(""),
            );
        }
        row.push(&item.recommendation);
        row.push(provenance_label(item.provenance));
        write_record(&mut out, &row);
    }
    out
}

/// `audit_report_YYYYMMDD_HHMMSS.csv` for the given instant.
pub fn report_filename(at: DateTime<Utc>) -> String {
    format!("audit_report_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

fn framework_columns(items: &[RiskItem], preferred: &[String]) -> Vec<String> {
    let seen: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.control_mapping.keys().map(String::as_str))
        .collect();

    let mut columns: Vec<String> = preferred
        .iter()
        .filter(|f| seen.contains(f.as_str()))
        .cloned()
        .collect();
    columns.extend(
        seen.into_iter()
            .filter(|f| !preferred.iter().any(|p| p == f))
            .map(str::to_string),
    );
    columns
}

fn provenance_label(provenance: Provenance) -> &'static str {
    match provenance {
        Provenance::Catalog => "CATALOG",
        Provenance::Generated => "GENERATED",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::TimeZone;

    use super::*;
    use crate::validate::NO_RECOMMENDATION;

    fn item(description: &str, controls: &[(&str, &str)], provenance: Provenance) -> RiskItem {
        RiskItem {
            description: description.to_string(),
            control_mapping: controls
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            recommendation: NO_RECOMMENDATION.to_string(),
            provenance,
        }
    }

    fn frameworks() -> Vec<String> {
        ["iso_27001", "soc_2", "hipaa", "nist_csf"]
            .map(String::from)
            .to_vec()
    }

    #[test]
    fn test_columns_follow_preferred_order() {
        let items = [
            item("a", &[("nist_csf", "PR.IP-4"), ("iso_27001", "A.8.13")], Provenance::Catalog),
            item("b", &[("soc_2", "CC6.1")], Provenance::Generated),
        ];
        let csv = to_csv(&items, &frameworks());
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(
            lines[0],
            "description,iso_27001,soc_2,nist_csf,recommendation,provenance"
        );
        assert_eq!(lines[1], "a,A.8.13,,PR.IP-4,None provided,CATALOG");
        assert_eq!(lines[2], "b,,CC6.1,,None provided,GENERATED");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_unknown_frameworks_appended_alphabetically() {
        let items = [item("a", &[("pci_dss", "8.3"), ("gdpr", "Art. 32")], Provenance::Generated)];
        let csv = to_csv(&items, &frameworks());
        assert!(csv.starts_with("description,gdpr,pci_dss,recommendation"));
    }

    #[test]
    fn test_fields_are_quoted() {
        let items = [item("Shared \"admin\", no MFA", &[], Provenance::Generated)];
        let csv = to_csv(&items, &[]);
        assert!(csv.contains("\"Shared \"\"admin\"\", no MFA\""));
    }

    #[test]
    fn test_empty_items_still_have_header() {
        assert_eq!(
            to_csv(&[], &frameworks()),
            "description,recommendation,provenance\r\n"
        );
    }

    #[test]
    fn test_report_filename() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(report_filename(at), "audit_report_20240307_090501.csv");
    }
}
