//! # Bingo goals - goal sheet <-> goal list conversion
//!
//! Converts the community goal spreadsheet (CSV) into the JSON goal list read
//! by the bingo card generator, and the goal list back into CSV. One column
//! [`Schema`] drives both directions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Sheet (URL) │────▶│ SheetCache  │────▶│  Row mapper │────▶│  Goal list  │
//! │             │     │ (goals.csv) │     │  (schema)   │     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bingo_goals::{csv_to_document, render_document, Schema};
//!
//! let csv = std::fs::read_to_string("goals.csv")?;
//! let result = csv_to_document(&Schema::legacy(), &csv)?;
//! println!("Converted {} goals", result.stats.converted);
//! std::fs::write("goal-list.json", render_document(&result.document)?)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Goal records and documents
//! - [`schema`] - Column schemas, built-ins and category order
//! - [`parser`] - CSV table reading and writing
//! - [`transform`] - Row mapping, document assembly and pipeline
//! - [`validation`] - Published document schemas
//! - [`fetch`] - Sheet download
//! - [`cache`] - Local sheet copy
//! - [`config`] - Environment configuration
//! - [`logs`] - Leveled, broadcast logs

// Core modules
pub mod error;
pub mod logs;
pub mod models;
pub mod schema;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Download and caching
pub mod cache;
pub mod fetch;

// Configuration
pub mod config;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConvertError, ConvertResult, FetchError, FetchResult, FormatError, RowError, RowResult,
    SchemaConfigError, ShapeError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Document, DocumentInfo, GoalRecord, WeightMap};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{
    canonical_categories, load_categories, BlankRowPolicy, Column, ColumnKind, DocumentLayout,
    ErrorPolicy, IdentifierRule, RowPolicy, Schema, BUILTIN_SCHEMAS, CANONICAL_CATEGORIES,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{read_table, read_text_file, write_table, Table, TableRow};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    convert_csv_file, convert_json_file, csv_to_document, csv_to_json, document_to_csv,
    document_to_rows, json_to_csv, parse_document_str, render_document, table_to_document,
    ConversionResult, ConversionStats, SkippedRow,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{document_schema, validate_document};

// =============================================================================
// Re-exports - Sheet
// =============================================================================

pub use cache::{CachedSheet, SheetCache, SheetMetadata, SheetOrigin};
pub use config::Config;
pub use fetch::SheetFetcher;
