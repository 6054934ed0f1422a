//! High-level conversion API.
//!
//! Combines table parsing, row mapping, document assembly and validation:
//!
//! ```text
//! CSV text ─▶ read_table ─▶ decode_row (per row, policy) ─▶ assemble ─▶ JSON
//! JSON ─▶ parse_document ─▶ flatten ─▶ encode_row ─▶ write_table ─▶ CSV text
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bingo_goals::{csv_to_document, render_document, Schema};
//!
//! let result = csv_to_document(&Schema::legacy(), &csv_text)?;
//! println!("{}", result.stats.summary());
//! std::fs::write("goal-list.json", render_document(&result.document)?)?;
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

use super::document::{assemble, flatten, parse_document};
use super::row::{decode_row, encode_row, header_row, is_blank_row, synergy_header};
use crate::error::{ConvertError, ConvertResult, RowError};
use crate::logs::{log_info, log_row_error, log_row_warning, log_success};
use crate::models::{Document, GoalRecord};
use crate::parser::{read_table, read_text_file, write_table, Table};
use crate::schema::{BlankRowPolicy, ErrorPolicy, Schema};
use crate::validation::validate_document;

/// A row left out under the skip policy.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// What happened to the data rows of one conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Data rows examined (stops at the terminating blank row).
    pub rows_read: usize,
    /// Rows that became records.
    pub converted: usize,
    /// Blank rows skipped.
    pub blank: usize,
    /// Rows that failed to decode and were skipped.
    pub skipped: Vec<SkippedRow>,
    /// Line of the blank row that ended the data, if any.
    pub terminated_at: Option<u64>,
}

impl ConversionStats {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Converted {} of {} rows ({} blank, {} skipped)",
            self.converted,
            self.rows_read,
            self.blank,
            self.skipped.len()
        );
        if let Some(line) = self.terminated_at {
            summary.push_str(&format!(", stopped at blank line {}", line));
        }
        summary
    }
}

/// Result of a CSV -> document conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub document: Document,
    pub stats: ConversionStats,
}

// =============================================================================
// CSV -> Document
// =============================================================================

/// Convert CSV text to a document.
pub fn csv_to_document(schema: &Schema, content: &str) -> ConvertResult<ConversionResult> {
    let table = read_table(content)?;
    table_to_document(schema, &table)
}

/// Convert a parsed table to a document, applying the schema's row policies.
///
/// Under [`ErrorPolicy::Abort`] the first bad row fails the whole conversion;
/// no document is returned.
pub fn table_to_document(schema: &Schema, table: &Table) -> ConvertResult<ConversionResult> {
    let synergies = synergy_header(schema, &table.header)?;
    let policy = schema.rows();

    log_info(format!(
        "Schema '{}': {} fixed columns, {} synergy categories",
        schema.name(),
        schema.width(),
        synergies.len()
    ));

    let mut records: Vec<GoalRecord> = Vec::new();
    let mut stats = ConversionStats::default();

    for row in &table.rows {
        if is_blank_row(&row.cells) {
            match policy.blank_rows {
                BlankRowPolicy::Skip => {
                    stats.blank += 1;
                    continue;
                }
                BlankRowPolicy::Terminate => {
                    log_info(format!("Blank row at line {}, treating as end of data", row.line));
                    stats.terminated_at = Some(row.line);
                    break;
                }
            }
        }

        stats.rows_read += 1;

        match decode_row(schema, &synergies, &row.cells) {
            Ok(record) => records.push(record),
            Err(RowError::Schema(e)) => return Err(e.into()),
            Err(e) => match policy.on_error {
                ErrorPolicy::Skip => {
                    log_row_warning(row.line, format!("skipped: {} (row: {:?})", e, row.cells));
                    stats.skipped.push(SkippedRow {
                        line: row.line,
                        reason: e.to_string(),
                    });
                }
                ErrorPolicy::Abort => {
                    log_row_error(row.line, format!("aborting: {} (row: {:?})", e, row.cells));
                    return Err(ConvertError::Row {
                        line: row.line,
                        row: row.cells.clone(),
                        source: e,
                    });
                }
            },
        }
    }

    stats.rows_read += stats.blank;
    stats.converted = records.len();

    let document = assemble(schema, records)?;
    log_success(stats.summary());

    Ok(ConversionResult { document, stats })
}

// =============================================================================
// Document -> CSV
// =============================================================================

/// Flatten a document into rows, header first.
pub fn document_to_rows(
    schema: &Schema,
    document: &Document,
    canonical_order: &[String],
) -> ConvertResult<Vec<Vec<String>>> {
    let mut rows = vec![header_row(schema, canonical_order)];

    for (group, record) in flatten(schema, document)? {
        let row = encode_row(schema, &record, group.as_deref(), canonical_order).map_err(
            |source| ConvertError::Encode {
                record: serde_json::to_string(&record).unwrap_or_else(|_| format!("{:?}", record)),
                source,
            },
        )?;
        rows.push(row);
    }

    Ok(rows)
}

/// Convert a document to CSV text in the canonical category order.
pub fn document_to_csv(
    schema: &Schema,
    document: &Document,
    canonical_order: &[String],
) -> ConvertResult<String> {
    let rows = document_to_rows(schema, document, canonical_order)?;
    log_success(format!("Encoded {} goals", rows.len() - 1));
    write_table(&rows)
}

// =============================================================================
// JSON text
// =============================================================================

/// Render a document as JSON with sorted keys and four-space indentation.
pub fn render_document(document: &Document) -> ConvertResult<String> {
    let value = sort_keys(document.to_value()?);

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    String::from_utf8(buffer).map_err(|_| ConvertError::Encoding("JSON output".to_string()))
}

/// Parse JSON text as a document in the schema's shape.
pub fn parse_document_str(schema: &Schema, content: &str) -> ConvertResult<Document> {
    let value: Value = serde_json::from_str(content)?;
    Ok(parse_document(schema, value)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

// =============================================================================
// Text conversions
// =============================================================================

/// Convert CSV text to rendered JSON, optionally checking the published schema.
pub fn csv_to_json(
    schema: &Schema,
    content: &str,
    validate: bool,
) -> ConvertResult<(String, ConversionStats)> {
    let result = csv_to_document(schema, content)?;

    if validate {
        validate_document(schema, &result.document)?;
        log_success("Document matches the published schema");
    }

    let json = render_document(&result.document)?;
    Ok((json, result.stats))
}

/// Convert JSON text to CSV text. Also returns the number of goals encoded.
pub fn json_to_csv(
    schema: &Schema,
    content: &str,
    canonical_order: &[String],
) -> ConvertResult<(String, usize)> {
    let document = parse_document_str(schema, content)?;
    let rows = document_to_rows(schema, &document, canonical_order)?;
    let goals = rows.len() - 1;
    log_success(format!("Encoded {} goals", goals));
    Ok((write_table(&rows)?, goals))
}

// =============================================================================
// Files
// =============================================================================

/// Convert a CSV file to a JSON file. Nothing is written if any step fails.
pub fn convert_csv_file(
    schema: &Schema,
    input: &Path,
    output: &Path,
    validate: bool,
) -> ConvertResult<ConversionStats> {
    log_info(format!(
        "Converting \"{}\" to \"{}\"",
        input.display(),
        output.display()
    ));

    let content = read_text_file(input)?;
    let (json, stats) = csv_to_json(schema, &content, validate)?;

    std::fs::write(output, json + "\n")?;
    log_success(format!("Wrote {} goals to \"{}\"", stats.converted, output.display()));

    Ok(stats)
}

/// Convert a JSON file back to a CSV file. Returns the number of goals written.
pub fn convert_json_file(
    schema: &Schema,
    input: &Path,
    output: &Path,
    canonical_order: &[String],
) -> ConvertResult<usize> {
    log_info(format!(
        "Converting \"{}\" to \"{}\"",
        input.display(),
        output.display()
    ));

    let content = read_text_file(input)?;
    let (csv, goals) = json_to_csv(schema, &content, canonical_order)?;

    std::fs::write(output, csv)?;
    log_success(format!("Wrote {} goals to \"{}\"", goals, output.display()));
    Ok(goals)
}
