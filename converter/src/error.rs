//! Error types for the goal sheet converter.
//!
//! One error type per layer:
//!
//! - [`FormatError`] - a cell does not parse under its column kind
//! - [`ShapeError`] - a row or document has the wrong structure
//! - [`SchemaConfigError`] - a schema declares conflicting destinations
//! - [`RowError`] - anything that can go wrong decoding or encoding one row
//! - [`FetchError`] - downloading or caching the source sheet
//! - [`ConvertError`] - top-level conversion errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Cell Errors
// =============================================================================

/// A cell's text does not parse under its declared type or marker convention.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("column '{column}': cannot parse '{value}' as {expected}")]
pub struct FormatError {
    /// Header label of the column (or synergy category).
    pub column: String,
    /// The offending cell text.
    pub value: String,
    /// Human-readable name of the expected type.
    pub expected: &'static str,
}

impl FormatError {
    pub fn new(column: impl Into<String>, value: impl Into<String>, expected: &'static str) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            expected,
        }
    }
}

// =============================================================================
// Shape Errors
// =============================================================================

/// A row or document does not have the structure the schema expects.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShapeError {
    /// Row width differs from schema columns plus synergy header.
    #[error("row has {found} cells, expected {expected} ({fixed} fixed + {synergies} synergy columns)")]
    RowWidth {
        expected: usize,
        found: usize,
        fixed: usize,
        synergies: usize,
    },

    /// Header row is narrower than the fixed schema columns.
    #[error("header has {found} cells, fewer than the {expected} fixed schema columns")]
    HeaderWidth { expected: usize, found: usize },

    /// Document root is not a JSON object.
    #[error("document root must be a JSON object")]
    NotAnObject,

    /// Document lacks a required top-level key.
    #[error("document is missing required key '{0}'")]
    MissingKey(String),

    /// A record group is not an array.
    #[error("group '{0}' must be an array of records")]
    InvalidGroup(String),

    /// A record could not be read from or written to the document.
    #[error("record {location}: {message}")]
    InvalidRecord { location: String, message: String },

    /// Document shape does not match the schema's layout.
    #[error("document layout does not match schema '{schema}'")]
    LayoutMismatch { schema: String },
}

// =============================================================================
// Schema Configuration Errors
// =============================================================================

/// Schema declares destinations that cannot coexist. Always fatal.
#[derive(Debug, Error)]
pub enum SchemaConfigError {
    /// Included column without a destination path.
    #[error("column '{column}' is included but has no destination path")]
    EmptyPath { column: String },

    /// Destination path with an empty field name.
    #[error("column '{column}' has an empty field name in its destination path")]
    EmptySegment { column: String },

    /// Two destinations overlap.
    #[error("destination '{path}' conflicts with '{other}'")]
    PathConflict { path: String, other: String },

    /// Destination lands on a key owned by the synergy fold.
    #[error("column '{column}' writes to reserved key '{key}'")]
    ReservedKey { column: String, key: String },

    /// A field the layout or identifier rule refers to is not produced by any column.
    #[error("'{path}' is not produced by any included {kind} column")]
    MissingColumn { path: String, kind: &'static str },

    /// Grouping column whose kind cannot produce a digit bucket key.
    #[error("grouping column '{column}' must be integer or string, not {kind}")]
    GroupKind { column: String, kind: &'static str },

    /// Neither a built-in schema name nor a readable file.
    #[error("unknown schema '{0}' (not a built-in name or a schema file)")]
    UnknownSchema(String),

    /// Failed to read a schema file.
    #[error("cannot read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// Schema file is not valid JSON.
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Row Errors
// =============================================================================

/// Errors while decoding or encoding a single row.
#[derive(Debug, Error)]
pub enum RowError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Schema(#[from] SchemaConfigError),
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors from downloading or caching the source sheet.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    /// Downloaded or cached bytes are not UTF-8.
    #[error("{0} is not valid UTF-8")]
    Encoding(String),

    /// Cache read/write failed.
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache metadata could not be written.
    #[error("cache metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

// =============================================================================
// Conversion Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// Returned by the functions in [`crate::transform::pipeline`]. No partial
/// output is produced when one of these is returned.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON reading or writing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File IO failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input text is not UTF-8.
    #[error("{0} is not valid UTF-8")]
    Encoding(String),

    /// CSV input has no header row.
    #[error("CSV input is empty (no header row)")]
    EmptyInput,

    /// Schema configuration error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaConfigError),

    /// Document or header structure error.
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// A data row failed to decode under the abort policy.
    #[error("line {line}: {source} (row: {row:?})")]
    Row {
        line: u64,
        row: Vec<String>,
        #[source]
        source: RowError,
    },

    /// A record failed to encode back to a row.
    #[error("cannot encode record {record}: {source}")]
    Encode {
        record: String,
        #[source]
        source: RowError,
    },

    /// Published document failed JSON Schema validation.
    #[error("document failed validation: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    /// Download or cache error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for row operations.
pub type RowResult<T> = Result<T, RowError>;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // FormatError -> RowError
        let row_err: RowError = FormatError::new("fire", "abc", "float").into();
        assert!(matches!(row_err, RowError::Format(_)));
        assert!(row_err.to_string().contains("abc"));

        // ShapeError -> ConvertError
        let convert_err: ConvertError = ShapeError::MissingKey("items".into()).into();
        assert!(convert_err.to_string().contains("items"));
    }

    #[test]
    fn test_row_error_carries_row_content() {
        let err = ConvertError::Row {
            line: 7,
            row: vec!["Dodongo".into(), "abc".into()],
            source: FormatError::new("difficulty", "abc", "integer").into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("Dodongo"));
        assert!(msg.contains("difficulty"));
    }

    #[test]
    fn test_row_width_format() {
        let err = ShapeError::RowWidth {
            expected: 6,
            found: 5,
            fixed: 4,
            synergies: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("5 cells"));
        assert!(msg.contains("expected 6"));
    }
}
