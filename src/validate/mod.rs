//! Structural checks on generated records.
//!
//! The validator only enforces shape. It never judges whether a control identifier is real;
//! it guarantees every surviving record has the three fields a reviewer needs and is labelled
//! [`Provenance::Generated`].

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::catalogue::RiskPattern;
use crate::constants::DEFAULT_RESULTS_FIELD;

/// Placeholder for a record without a description.
pub const UNKNOWN_RISK: &str = "Unknown risk";
/// Placeholder for a record without a recommendation.
pub const NO_RECOMMENDATION: &str = "None provided";

/// Flat keys older prompts produced instead of a nested mapping, with the framework each one
/// folds into. Later entries overwrite earlier ones.
const LEGACY_CONTROL_KEYS: [(&str, &str); 5] = [
    ("iso_control", "iso_27001"),
    ("iso_27001", "iso_27001"),
    ("soc_2", "soc_2"),
    ("hipaa", "hipaa"),
    ("nist_csf", "nist_csf"),
];

/// Where a record's control identifiers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Copied verbatim from a confidently matched catalogue pattern.
    Catalog,
    /// Produced by the generative model.
    Generated,
}

/// One classified risk, as returned to callers and exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskItem {
    pub description: String,
    /// Framework → control identifier.
    #[serde(default)]
    pub control_mapping: BTreeMap<String, String>,
    pub recommendation: String,
    pub provenance: Provenance,
}

impl RiskItem {
    /// Item carrying a matched pattern's description and controls, untouched.
    pub fn from_pattern(pattern: &RiskPattern) -> Self {
        Self {
            description: pattern.description.clone(),
            control_mapping: pattern.controls.clone(),
            recommendation: NO_RECOMMENDATION.to_string(),
            provenance: Provenance::Catalog,
        }
    }
}

/// Why a parsed model reply could not be turned into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidResultStructure {
    /// Neither an array nor an object.
    #[error("expected an array of records or an object, found {found}")]
    UnexpectedShape { found: &'static str },

    /// An object without the results field.
    #[error("object has no '{field}' field")]
    MissingResultsField { field: String },

    /// The results field holds something other than an array.
    #[error("'{field}' must be an array, found {found}")]
    ResultsNotArray { field: String, found: &'static str },

    /// One element of the batch is not an object; the whole batch is refused.
    #[error("record {index} is {found}, not an object")]
    NonObjectRecord { index: usize, found: &'static str },
}

/// Turns extracted JSON into [`RiskItem`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultValidator {
    results_field: String,
}

impl Default for ResultValidator {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_FIELD)
    }
}

impl ResultValidator {
    /// Validator reading records from `results_field` when the reply is an object.
    pub fn new(results_field: impl Into<String>) -> Self {
        Self {
            results_field: results_field.into(),
        }
    }

    pub fn results_field(&self) -> &str {
        &self.results_field
    }

    /// Accepts a bare array of records or an object holding one under the results field.
    ///
    /// Missing fields get placeholders. Any element that is not an object rejects the batch.
    pub fn validate(&self, value: &Value) -> Result<Vec<RiskItem>, InvalidResultStructure> {
        let records = match value {
            Value::Array(records) => records,
            Value::Object(map) => match map.get(&self.results_field) {
                Some(Value::Array(records)) => records,
                Some(other) => {
                    return Err(InvalidResultStructure::ResultsNotArray {
                        field: self.results_field.clone(),
                        found: kind(other),
                    });
                }
                None => {
                    return Err(InvalidResultStructure::MissingResultsField {
                        field: self.results_field.clone(),
                    });
                }
            },
            other => {
                return Err(InvalidResultStructure::UnexpectedShape { found: kind(other) });
            }
        };

        let objects = records
            .iter()
            .enumerate()
            .map(|(index, record)| match record {
                Value::Object(map) => Ok(map),
                other => Err(InvalidResultStructure::NonObjectRecord {
                    index,
                    found: kind(other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let items: Vec<RiskItem> = objects.into_iter().map(to_item).collect();
        debug!(records = items.len(), "Validated generated records");
        Ok(items)
    }
}

fn to_item(record: &Map<String, Value>) -> RiskItem {
    RiskItem {
        description: text_field(record, "description").unwrap_or_else(|| UNKNOWN_RISK.into()),
        control_mapping: control_mapping(record),
        recommendation: text_field(record, "recommendation")
            .unwrap_or_else(|| NO_RECOMMENDATION.into()),
        provenance: Provenance::Generated,
    }
}

/// Strings as-is, other non-null values as their JSON text. Blank counts as missing.
fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match record.get(key)? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn control_mapping(record: &Map<String, Value>) -> BTreeMap<String, String> {
    let nested = record
        .get("controlMapping")
        .or_else(|| record.get("control_mapping"));

    match nested {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(framework, id)| control_id(id).map(|id| (framework.clone(), id)))
            .collect(),
        Some(_) => BTreeMap::new(),
        None => LEGACY_CONTROL_KEYS
            .iter()
            .filter_map(|(key, framework)| {
                let id = control_id(record.get(*key)?)?;
                Some((framework.to_string(), id))
            })
            .collect(),
    }
}

/// Scalar control ids as strings; nulls, blanks and nested values are dropped.
fn control_id(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
