use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors raised while loading the risk-pattern catalogue.
pub enum CatalogueError {
    /// The catalogue file could not be read.
    #[error("failed to read catalogue at {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV text is malformed.
    #[error("malformed CSV at line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// A required column is missing from the header.
    #[error("catalogue header is missing required column '{column}'")]
    MissingColumn {
        /// Column name.
        column: &'static str,
    },

    /// Two rows share a pattern id.
    #[error("duplicate risk pattern id '{id}'")]
    DuplicateId {
        /// Offending id.
        id: String,
    },

    /// A row has an empty id or description.
    #[error("row {row}: {field} must not be empty")]
    EmptyField {
        /// 1-based data row number.
        row: usize,
        /// Field name.
        field: &'static str,
    },

    /// A pattern maps to no framework at all.
    #[error("risk pattern '{id}' has no control identifiers")]
    NoControls {
        /// Pattern id.
        id: String,
    },

    /// The catalogue holds no patterns.
    #[error("catalogue is empty")]
    Empty,
}
