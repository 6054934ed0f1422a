//! Transformation module.
//!
//! This module handles sheet <-> document conversion:
//! - Row: one CSV row to one goal record and back
//! - Document: records to the published document shape and back
//! - Pipeline: policies, stats and the text/file entry points

pub mod document;
pub mod pipeline;
pub mod row;

pub use document::{assemble, flatten, parse_document, FlatRecord, INFO_KEY};
pub use pipeline::*;
pub use row::{decode_row, encode_row, fold_synergies, header_row, id_from_name, is_blank_row};
