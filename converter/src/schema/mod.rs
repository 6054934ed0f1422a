//! Column schema definition.
//!
//! A [`Schema`] is the single source of truth for both conversion directions:
//! the ordered fixed columns at the front of every row, where each one lands in
//! a [`GoalRecord`](crate::models::GoalRecord), the document layout, the
//! identifier rule and the row policies.
//!
//! Schemas are plain serde data, so besides the built-ins in [`builtin`] they
//! can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "name": "legacy",
//!   "columns": [
//!     {"header": "name", "kind": "string", "path": ["name"]},
//!     {"header": "difficulty", "kind": "integer", "path": ["difficulty"]},
//!     {"header": "notes", "kind": "ignored"}
//!   ],
//!   "layout": {"type": "grouped", "group_by": ["difficulty"], "version": "v9"},
//!   "rows": {"blank_rows": "skip", "on_error": "skip"}
//! }
//! ```

pub mod builtin;
pub mod categories;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::error::{FormatError, SchemaConfigError};

pub use builtin::BUILTIN_SCHEMAS;
pub use categories::{canonical_categories, load_categories, parse_category_list, CANONICAL_CATEGORIES};

/// Top-level record keys owned by the synergy fold.
pub const RESERVED_KEYS: [&str; 2] = ["types", "subtypes"];

const TRUE_TOKENS: [&str; 3] = ["true", "yes", "y"];
const FALSE_TOKENS: [&str; 3] = ["false", "no", "n"];

// =============================================================================
// Column Kinds
// =============================================================================

/// How a source cell is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Passed through unchanged.
    String,
    /// Base-10 integer.
    Integer,
    /// Decimal floating point.
    Float,
    /// `true/yes/y` or `false/no/n`, case-insensitive.
    Boolean,
    /// Consumes its slot, produces nothing.
    Ignored,
}

impl ColumnKind {
    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::String => "string",
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Ignored => "ignored",
        }
    }

    /// Parse a raw cell. `Ok(None)` for ignored columns.
    pub fn decode(self, column: &str, raw: &str) -> Result<Option<Value>, FormatError> {
        match self {
            ColumnKind::String => Ok(Some(Value::String(raw.to_string()))),
            ColumnKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(|n| Some(Value::from(n)))
                .map_err(|_| FormatError::new(column, raw, "integer")),
            ColumnKind::Float => parse_float(column, raw).map(|f| Some(Value::from(f))),
            ColumnKind::Boolean => parse_bool(column, raw).map(|b| Some(Value::Bool(b))),
            ColumnKind::Ignored => Ok(None),
        }
    }

    /// Render a record value back to cell text. `None` if the value is not a scalar.
    pub fn encode(self, value: &Value) -> Option<String> {
        match (self, value) {
            (ColumnKind::Ignored, _) | (_, Value::Null) => Some(String::new()),
            (_, Value::String(s)) => Some(s.clone()),
            (_, Value::Bool(b)) => Some(b.to_string()),
            (ColumnKind::Float, Value::Number(n)) => n.as_f64().map(format_float),
            (_, Value::Number(n)) if n.is_f64() => n.as_f64().map(format_float),
            (_, Value::Number(n)) => Some(n.to_string()),
            (_, Value::Array(_)) | (_, Value::Object(_)) => None,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a finite float, surrounding whitespace allowed.
pub fn parse_float(column: &str, raw: &str) -> Result<f64, FormatError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| FormatError::new(column, raw, "float"))
}

fn parse_bool(column: &str, raw: &str) -> Result<bool, FormatError> {
    let token = raw.trim().to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Ok(false)
    } else {
        Err(FormatError::new(column, raw, "boolean"))
    }
}

/// Shortest round-trip form, with `.0` kept on whole numbers (`1.0`, not `1`).
///
/// Magnitudes from `1e16` up and below `1e-4` use exponent notation with a
/// signed, two-digit exponent (`1e+16`, `1.5e-05`).
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if !value.is_finite() {
        value.to_string()
    } else if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        exponent_form(value)
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn exponent_form(value: f64) -> String {
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

// =============================================================================
// Column Descriptor
// =============================================================================

/// One fixed source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Header label written on encode. Ignored on decode (only position matters).
    pub header: String,

    pub kind: ColumnKind,

    /// Destination field names, outermost first. Empty for ignored columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl Column {
    pub fn new(header: &str, kind: ColumnKind, path: &[&str]) -> Self {
        Self {
            header: header.to_string(),
            kind,
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn string(header: &str, path: &[&str]) -> Self {
        Self::new(header, ColumnKind::String, path)
    }

    pub fn integer(header: &str, path: &[&str]) -> Self {
        Self::new(header, ColumnKind::Integer, path)
    }

    pub fn float(header: &str, path: &[&str]) -> Self {
        Self::new(header, ColumnKind::Float, path)
    }

    pub fn boolean(header: &str, path: &[&str]) -> Self {
        Self::new(header, ColumnKind::Boolean, path)
    }

    pub fn ignored(header: &str) -> Self {
        Self::new(header, ColumnKind::Ignored, &[])
    }

    pub fn included(&self) -> bool {
        self.kind != ColumnKind::Ignored
    }

    pub fn decode(&self, raw: &str) -> Result<Option<Value>, FormatError> {
        self.kind.decode(&self.header, raw)
    }
}

// =============================================================================
// Layout, Identifier, Policies
// =============================================================================

/// Top-level shape of the published document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentLayout {
    /// Records bucketed by the value at `group_by`, plus `info.version`.
    Grouped { group_by: Vec<String>, version: String },
    /// `{"cardType": ..., "items": [...]}` in row order.
    Items { card_type: String },
}

/// Where the stable identifier goes and which field it is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRule {
    /// Destination of the identifier (usually `["id"]`).
    pub target: Vec<String>,
    /// Display-name field the slug is computed from.
    pub source: Vec<String>,
}

/// What to do with a row whose first cell (or every cell) is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankRowPolicy {
    /// Ignore the row and keep going.
    #[default]
    Skip,
    /// Treat the row as the end of data.
    Terminate,
}

/// What to do with a row that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Report the row and leave it out of the document.
    Skip,
    /// Report the row and fail the whole run.
    #[default]
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowPolicy {
    #[serde(default)]
    pub blank_rows: BlankRowPolicy,
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

// =============================================================================
// Schema
// =============================================================================

/// Validated, immutable column schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDef")]
pub struct Schema {
    name: String,
    columns: Vec<Column>,
    layout: DocumentLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<IdentifierRule>,
    rows: RowPolicy,
}

/// Unvalidated schema as it appears in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    pub columns: Vec<Column>,
    pub layout: DocumentLayout,
    #[serde(default)]
    pub identifier: Option<IdentifierRule>,
    #[serde(default)]
    pub rows: RowPolicy,
}

impl TryFrom<SchemaDef> for Schema {
    type Error = SchemaConfigError;

    fn try_from(def: SchemaDef) -> Result<Self, Self::Error> {
        Schema::new(def.name, def.columns, def.layout, def.identifier, def.rows)
    }
}

impl Schema {
    /// Build a schema, rejecting destinations that would collide at runtime.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<Column>,
        layout: DocumentLayout,
        identifier: Option<IdentifierRule>,
        rows: RowPolicy,
    ) -> Result<Self, SchemaConfigError> {
        let schema = Self {
            name: name.into(),
            columns,
            layout,
            identifier,
            rows,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Parse and validate a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self, SchemaConfigError> {
        let def: SchemaDef = serde_json::from_str(json)?;
        Schema::try_from(def)
    }

    /// Load a schema file.
    pub fn load(path: &Path) -> Result<Self, SchemaConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// A built-in schema name, or else a path to a schema file.
    pub fn resolve(name_or_path: &str) -> Result<Self, SchemaConfigError> {
        if let Some(schema) = Self::builtin(name_or_path) {
            return Ok(schema);
        }
        let path = Path::new(name_or_path);
        if path.is_file() {
            Self::load(path)
        } else {
            Err(SchemaConfigError::UnknownSchema(name_or_path.to_string()))
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of fixed leading columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    pub fn identifier(&self) -> Option<&IdentifierRule> {
        self.identifier.as_ref()
    }

    pub fn rows(&self) -> RowPolicy {
        self.rows
    }

    /// Same schema with different row policies.
    pub fn with_rows(mut self, rows: RowPolicy) -> Self {
        self.rows = rows;
        self
    }

    /// Header labels of the fixed columns.
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    /// Column whose value becomes the group key, for grouped layouts.
    pub fn group_column(&self) -> Option<&Column> {
        match &self.layout {
            DocumentLayout::Grouped { group_by, .. } => self
                .columns
                .iter()
                .find(|c| c.included() && c.path == *group_by),
            DocumentLayout::Items { .. } => None,
        }
    }

    fn validate(&self) -> Result<(), SchemaConfigError> {
        let included: Vec<&Column> = self.columns.iter().filter(|c| c.included()).collect();

        for column in &included {
            check_path(&column.header, &column.path)?;
        }

        for (i, a) in included.iter().enumerate() {
            for b in &included[i + 1..] {
                check_overlap(&a.path, &b.path)?;
            }
        }

        if let Some(rule) = &self.identifier {
            check_path("identifier", &rule.target)?;
            for column in &included {
                if column.path == rule.target {
                    // An explicit id column must hold text.
                    if column.kind != ColumnKind::String {
                        return Err(SchemaConfigError::PathConflict {
                            path: rule.target.join("."),
                            other: format!("{} ({} column)", column.header, column.kind),
                        });
                    }
                } else {
                    check_overlap(&rule.target, &column.path)?;
                }
            }
            let has_source = included
                .iter()
                .any(|c| c.kind == ColumnKind::String && c.path == rule.source);
            if !has_source {
                return Err(SchemaConfigError::MissingColumn {
                    path: rule.source.join("."),
                    kind: "string",
                });
            }
        }

        if let DocumentLayout::Grouped { group_by, .. } = &self.layout {
            let Some(column) = self.group_column() else {
                return Err(SchemaConfigError::MissingColumn {
                    path: group_by.join("."),
                    kind: "grouping",
                });
            };
            if !matches!(column.kind, ColumnKind::Integer | ColumnKind::String) {
                return Err(SchemaConfigError::GroupKind {
                    column: column.header.clone(),
                    kind: column.kind.name(),
                });
            }
        }

        Ok(())
    }
}

fn check_path(column: &str, path: &[String]) -> Result<(), SchemaConfigError> {
    let Some(first) = path.first() else {
        return Err(SchemaConfigError::EmptyPath {
            column: column.to_string(),
        });
    };
    if path.iter().any(|segment| segment.is_empty()) {
        return Err(SchemaConfigError::EmptySegment {
            column: column.to_string(),
        });
    }
    if RESERVED_KEYS.contains(&first.as_str()) {
        return Err(SchemaConfigError::ReservedKey {
            column: column.to_string(),
            key: first.clone(),
        });
    }
    Ok(())
}

/// Equal paths, or one being a prefix of the other, collide.
fn check_overlap(a: &[String], b: &[String]) -> Result<(), SchemaConfigError> {
    let shared = a.len().min(b.len());
    if a[..shared] == b[..shared] {
        return Err(SchemaConfigError::PathConflict {
            path: a.join("."),
            other: b.join("."),
        });
    }
    Ok(())
}
