//! Risk-pattern catalogue (the framework crosswalk).
//!
//! Each row of the crosswalk CSV is one [`RiskPattern`]: a slug, a natural-language description
//! that the index embeds, and one control identifier per framework column. Patterns are wrapped
//! in `Arc` on load and never mutated afterwards; index hits hand out clones of those `Arc`s so
//! a catalogue match always surfaces the exact controls it was built from.

pub mod csv;
mod error;


pub use error::CatalogueError;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

/// Header naming the pattern id column.
pub const ID_COLUMN: &str = "risk_pattern";
/// Header naming the description column.
pub const DESCRIPTION_COLUMN: &str = "description";

/// Descriptions shorter than this embed poorly.
pub const RECOMMENDED_MIN_WORDS: usize = 20;
/// Descriptions longer than this dilute the embedding.
pub const RECOMMENDED_MAX_WORDS: usize = 30;

/// One known risk pattern and the controls it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPattern {
    /// Unique slug, e.g. `backups_not_tested`.
    pub id: String,
    /// Embedding source text.
    pub description: String,
    /// Framework name → control identifier. Frameworks without an identifier are absent.
    pub controls: BTreeMap<String, String>,
}

impl RiskPattern {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        controls: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            controls: controls.into_iter().collect(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.description.split_whitespace().count()
    }
}

/// The immutable set of patterns the index is built from.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    patterns: Vec<Arc<RiskPattern>>,
    by_id: HashMap<String, usize>,
    frameworks: Vec<String>,
}

impl Catalogue {
    /// Builds a catalogue from already-parsed patterns.
    pub fn from_patterns(patterns: Vec<RiskPattern>) -> Result<Self, CatalogueError> {
        let mut catalogue = Self::default();
        for pattern in patterns {
            catalogue.push(pattern)?;
        }
        if catalogue.patterns.is_empty() {
            return Err(CatalogueError::Empty);
        }
        Ok(catalogue)
    }

    /// Reads and parses a crosswalk CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, CatalogueError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogueError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalogue = Self::from_csv_str(&text)?;

        info!(
            path = %path.display(),
            patterns = catalogue.len(),
            frameworks = catalogue.frameworks.len(),
            "Loaded risk-pattern catalogue"
        );

        Ok(catalogue)
    }

    /// Parses crosswalk CSV text.
    ///
    /// The header must contain [`ID_COLUMN`] and [`DESCRIPTION_COLUMN`]; every other column is
    /// treated as a framework. Empty framework cells mean the pattern has no identifier there.
    pub fn from_csv_str(text: &str) -> Result<Self, CatalogueError> {
        let mut records = csv::parse_records(text)?.into_iter();

        let header: Vec<String> = records
            .next()
            .ok_or(CatalogueError::Empty)?
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let id_col = column_index(&header, ID_COLUMN)?;
        let desc_col = column_index(&header, DESCRIPTION_COLUMN)?;
        let framework_cols: Vec<(usize, &str)> = header
            .iter()
            .enumerate()
            .filter(|(i, name)| *i != id_col && *i != desc_col && !name.is_empty())
            .map(|(i, name)| (i, name.as_str()))
            .collect();

        let mut catalogue = Self {
            frameworks: framework_cols.iter().map(|(_, f)| f.to_string()).collect(),
            ..Self::default()
        };
        for (row_idx, record) in records.enumerate() {
            let row = row_idx + 1;
            if record.len() != header.len() {
                return Err(CatalogueError::Malformed {
                    line: row + 1,
                    reason: format!(
                        "expected {} fields, found {}",
                        header.len(),
                        record.len()
                    ),
                });
            }

            let id = record[id_col].trim();
            if id.is_empty() {
                return Err(CatalogueError::EmptyField { row, field: "id" });
            }
            let description = record[desc_col].trim();
            if description.is_empty() {
                return Err(CatalogueError::EmptyField {
                    row,
                    field: DESCRIPTION_COLUMN,
                });
            }

            let controls = framework_cols.iter().filter_map(|(i, framework)| {
                let value = record[*i].trim();
                (!value.is_empty()).then(|| (framework.to_string(), value.to_string()))
            });

            catalogue.push(RiskPattern::new(id, description, controls))?;
        }

        if catalogue.patterns.is_empty() {
            return Err(CatalogueError::Empty);
        }
        Ok(catalogue)
    }

    fn push(&mut self, pattern: RiskPattern) -> Result<(), CatalogueError> {
        if self.by_id.contains_key(&pattern.id) {
            return Err(CatalogueError::DuplicateId { id: pattern.id });
        }
        if pattern.controls.is_empty() {
            return Err(CatalogueError::NoControls { id: pattern.id });
        }

        let words = pattern.word_count();
        if !(RECOMMENDED_MIN_WORDS..=RECOMMENDED_MAX_WORDS).contains(&words) {
            warn!(
                pattern_id = %pattern.id,
                words,
                "Pattern description outside the recommended {}-{} words; retrieval quality may suffer",
                RECOMMENDED_MIN_WORDS,
                RECOMMENDED_MAX_WORDS
            );
        }

        for framework in pattern.controls.keys() {
            if !self.frameworks.contains(framework) {
                self.frameworks.push(framework.clone());
            }
        }

        self.by_id.insert(pattern.id.clone(), self.patterns.len());
        self.patterns.push(Arc::new(pattern));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<RiskPattern>> {
        self.by_id.get(id).map(|&i| &self.patterns[i])
    }

    /// Catalogue position of a pattern, used as the tie-break order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RiskPattern>> {
        self.patterns.iter()
    }

    /// Framework names in column order (first-seen order for hand-built catalogues).
    pub fn frameworks(&self) -> &[String] {
        &self.frameworks
    }
}

fn column_index(header: &[String], column: &'static str) -> Result<usize, CatalogueError> {
    header
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or(CatalogueError::MissingColumn { column })
}
