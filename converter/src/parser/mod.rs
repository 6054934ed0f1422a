//! Tabular input/output.
//!
//! Reads comma-separated UTF-8 text into a header plus positional rows, and
//! writes rows back. Cells are kept as raw strings; typing happens in the
//! row mapper.

use std::path::Path;

use crate::error::{ConvertError, ConvertResult};

/// A data row with its 1-based line number in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub line: u64,
    pub cells: Vec<String>,
}

/// Parsed CSV: header cells and data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// Decode UTF-8 bytes, dropping a leading BOM. `None` if the bytes are not UTF-8.
pub fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Read a file as UTF-8 text.
pub fn read_text_file(path: &Path) -> ConvertResult<String> {
    let bytes = std::fs::read(path)?;
    decode_utf8(&bytes).ok_or_else(|| ConvertError::Encoding(path.display().to_string()))
}

/// Parse CSV text. The first record is the header; rows may differ in width.
///
/// # Example
/// ```ignore
/// let table = read_table("name,jp,difficulty,child,fire\nDodongo,ドドンゴ,3,true,1.0")?;
/// assert_eq!(table.header.len(), 5);
/// assert_eq!(table.rows[0].line, 2);
/// ```
pub fn read_table(content: &str) -> ConvertResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?.iter().map(String::from).collect(),
        None => return Err(ConvertError::EmptyInput),
    };

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);
        rows.push(TableRow {
            line,
            cells: record.iter().map(String::from).collect(),
        });
    }

    Ok(Table { header, rows })
}

/// Write rows as CSV text.
pub fn write_table(rows: &[Vec<String>]) -> ConvertResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|_| ConvertError::Encoding("CSV output".to_string()))
}
