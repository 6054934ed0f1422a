//! Row mapper: one CSV row <-> one [`GoalRecord`].
//!
//! ```text
//!  fixed prefix (schema width)          suffix (one cell per synergy category)
//! ┌──────┬──────┬────────────┬───────┐ ┌──────┬──────┬─────┐
//! │ name │ jp   │ difficulty │ child │ │ 1.0  │ *0.5 │     │
//! └──┬───┴──┬───┴─────┬──────┴───┬───┘ └──┬───┴──┬───┴──┬──┘
//!    │      │         │          │        │      │      └─ skipped
//!    ▼      ▼         ▼          ▼        ▼      ▼
//!  schema columns -> fields at paths    types  subtypes
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::document::is_group_key;
use crate::error::{FormatError, RowResult, ShapeError};
use crate::models::{GoalRecord, WeightMap};
use crate::schema::{format_float, parse_float, Column, DocumentLayout, IdentifierRule, Schema};

/// Leading character marking a subtype weight.
pub const SUBTYPE_MARKER: char = '*';

/// Separator used in derived identifiers.
pub const SLUG_SEPARATOR: &str = "-";

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug pattern"));

/// Derive a stable identifier from a display name.
///
/// Lower-cases, then replaces each maximal run of non-alphanumeric characters
/// with a single `-`: `"Song of Time!"` becomes `"song-of-time-"`.
pub fn id_from_name(name: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(&name.to_lowercase(), SLUG_SEPARATOR)
        .into_owned()
}

/// True when the first cell, or every cell, is empty.
pub fn is_blank_row<S: AsRef<str>>(row: &[S]) -> bool {
    match row.first() {
        None => true,
        Some(first) => {
            first.as_ref().trim().is_empty() || row.iter().all(|c| c.as_ref().trim().is_empty())
        }
    }
}

/// Synergy category names: the header cells after the fixed schema columns.
pub fn synergy_header(schema: &Schema, header: &[String]) -> Result<Vec<String>, ShapeError> {
    if header.len() < schema.width() {
        return Err(ShapeError::HeaderWidth {
            expected: schema.width(),
            found: header.len(),
        });
    }
    Ok(header[schema.width()..].to_vec())
}

/// Header row for encoding: fixed column labels, then the category order.
pub fn header_row(schema: &Schema, canonical_order: &[String]) -> Vec<String> {
    let mut header = schema.headers();
    header.extend(canonical_order.iter().cloned());
    header
}

/// Decode one source row into a goal record.
pub fn decode_row<S: AsRef<str>>(
    schema: &Schema,
    synergy_header: &[String],
    row: &[S],
) -> RowResult<GoalRecord> {
    let fixed = schema.width();
    let expected = fixed + synergy_header.len();
    if row.len() != expected {
        return Err(ShapeError::RowWidth {
            expected,
            found: row.len(),
            fixed,
            synergies: synergy_header.len(),
        }
        .into());
    }

    let (prefix, suffix) = row.split_at(fixed);
    let group_path = schema.group_column().map(|c| &c.path);
    let mut record = GoalRecord::new();

    for (column, cell) in schema.columns().iter().zip(prefix) {
        let raw = cell.as_ref();
        if let Some(value) = column.decode(raw)? {
            let value = if group_path == Some(&column.path) {
                group_key(column, raw)?
            } else {
                value
            };
            record.set(&column.path, value)?;
        }
    }

    if let Some(rule) = schema.identifier() {
        assign_identifier(&mut record, rule)?;
    }

    let (types, subtypes) = fold_synergies(synergy_header, suffix)?;
    record.types = types;
    record.subtypes = subtypes;

    Ok(record)
}

/// Bucket key of a grouped layout: the trimmed cell text, which must be all
/// digits. `03` stays `03`; `-1` and `+3` are rejected.
fn group_key(column: &Column, raw: &str) -> Result<Value, FormatError> {
    let key = raw.trim();
    if is_group_key(key) {
        Ok(Value::String(key.to_string()))
    } else {
        Err(FormatError::new(&column.header, raw, "non-negative integer group key"))
    }
}

/// Keep a non-empty explicit id, otherwise slug the display name.
fn assign_identifier(record: &mut GoalRecord, rule: &IdentifierRule) -> RowResult<()> {
    let has_explicit = record
        .get_str(&rule.target)
        .is_some_and(|id| !id.is_empty());
    if has_explicit {
        return Ok(());
    }

    let id = id_from_name(record.get_str(&rule.source).unwrap_or_default());
    record.set(&rule.target, Value::String(id))?;
    Ok(())
}

/// Fold synergy cells into `(types, subtypes)`.
///
/// Empty cells produce nothing; `*`-prefixed cells go to subtypes.
pub fn fold_synergies<S: AsRef<str>>(
    categories: &[String],
    cells: &[S],
) -> Result<(WeightMap, WeightMap), FormatError> {
    let mut types = WeightMap::new();
    let mut subtypes = WeightMap::new();

    for (category, cell) in categories.iter().zip(cells) {
        let text = cell.as_ref();
        if text.trim().is_empty() {
            continue;
        }
        match text.strip_prefix(SUBTYPE_MARKER) {
            Some(weight) => {
                subtypes.insert(category.clone(), parse_float(category, weight)?);
            }
            None => {
                types.insert(category.clone(), parse_float(category, text)?);
            }
        }
    }

    Ok((types, subtypes))
}

/// Encode a record back to a flat row.
///
/// `group` is the bucket key the record came from in a grouped document; it
/// fills the grouping column. Categories outside `canonical_order` are dropped.
pub fn encode_row(
    schema: &Schema,
    record: &GoalRecord,
    group: Option<&str>,
    canonical_order: &[String],
) -> RowResult<Vec<String>> {
    let group_path = match schema.layout() {
        DocumentLayout::Grouped { group_by, .. } => Some(group_by),
        DocumentLayout::Items { .. } => None,
    };

    let mut row = Vec::with_capacity(schema.width() + canonical_order.len());

    for column in schema.columns() {
        if !column.included() {
            row.push(String::new());
            continue;
        }

        if let (Some(key), Some(path)) = (group, group_path) {
            if column.path == *path {
                row.push(key.to_string());
                continue;
            }
        }

        let cell = match record.get(&column.path) {
            None => String::new(),
            Some(value) => column.kind.encode(value).ok_or_else(|| ShapeError::InvalidRecord {
                location: column.path.join("."),
                message: format!("expected a {} value, found {}", column.kind, value),
            })?,
        };
        row.push(cell);
    }

    row.extend(canonical_order.iter().map(|c| synergy_cell(record, c)));
    Ok(row)
}

fn synergy_cell(record: &GoalRecord, category: &str) -> String {
    if let Some(weight) = record.types.get(category) {
        format_float(*weight)
    } else if let Some(weight) = record.subtypes.get(category) {
        format!("{}{}", SUBTYPE_MARKER, format_float(*weight))
    } else {
        String::new()
    }
}
