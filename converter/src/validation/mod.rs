//! JSON Schema validation for goal documents.
//!
//! Generated documents are checked against the published document schemas
//! using JSON Schema Draft 7 before they are written.
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `goal-list-grouped.json` (difficulty buckets plus `info`)
//! - `goal-list-items.json` (`cardType` plus `items`)
//!
//! Both pin the field types of the built-in sheet schemas. Documents produced
//! by a custom schema are only checked for structure: the per-goal field
//! constraints are dropped and only `types`/`subtypes` stay typed.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use bingo_goals::validation::{document_schema, validate};
//! use bingo_goals::Schema;
//!
//! let doc = json!({
//!     "3": [{ "name": "Dodongo", "types": { "fire": 1.0 } }],
//!     "info": { "version": "v9" }
//! });
//! assert!(validate(&document_schema(&Schema::legacy()), &doc).is_ok());
//! ```

use serde_json::Value;

use crate::error::{ConvertError, ConvertResult};
use crate::models::Document;
use crate::schema::{DocumentLayout, Schema, BUILTIN_SCHEMAS};

const GROUPED_SCHEMA: &str = include_str!("../../schemas/goal-list-grouped.json");
const ITEMS_SCHEMA: &str = include_str!("../../schemas/goal-list-items.json");

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation otherwise
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use bingo_goals::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["cardType"],
///     "properties": { "cardType": { "type": "string" } }
/// });
///
/// assert!(validate(&schema, &json!({ "cardType": "bingo" })).is_ok());
/// assert!(validate(&schema, &json!({ "items": [] })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn embedded(source: &str) -> Value {
    serde_json::from_str(source).expect("Invalid embedded schema")
}

/// The document schema that applies to documents produced by `schema`.
pub fn document_schema(schema: &Schema) -> Value {
    let mut published = match schema.layout() {
        DocumentLayout::Grouped { .. } => embedded(GROUPED_SCHEMA),
        DocumentLayout::Items { .. } => embedded(ITEMS_SCHEMA),
    };

    if !BUILTIN_SCHEMAS.contains(&schema.name()) {
        if let Some(Value::Object(properties)) =
            published.pointer_mut("/definitions/goal/properties")
        {
            properties.retain(|key, _| key == "types" || key == "subtypes");
        }
    }

    published
}

/// Validate a document produced by `schema`.
pub fn validate_document(schema: &Schema, document: &Document) -> ConvertResult<()> {
    let value = document.to_value()?;
    validate(&document_schema(schema), &value).map_err(|errors| ConvertError::Validation { errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, RowPolicy};
    use serde_json::json;

    fn legacy() -> Value {
        document_schema(&Schema::legacy())
    }

    fn current() -> Value {
        document_schema(&Schema::current())
    }

    #[test]
    fn test_valid_grouped() {
        let doc = json!({
            "3": [{ "name": "Dodongo", "jp": "ドドンゴ", "child": "true",
                    "types": { "fire": 1.0 }, "subtypes": { "ice": 0.5 } }],
            "03": [],
            "10": [],
            "info": { "version": "v9" }
        });
        assert!(validate(&legacy(), &doc).is_ok());
    }

    #[test]
    fn test_grouped_requires_info() {
        let doc = json!({ "3": [] });
        let errors = validate(&legacy(), &doc).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("info")));
    }

    #[test]
    fn test_grouped_rejects_non_digit_bucket() {
        let info = json!({ "version": "v9" });
        assert!(validate(&legacy(), &json!({ "hard": [], "info": info })).is_err());
        assert!(validate(&legacy(), &json!({ "-1": [], "info": info })).is_err());
    }

    #[test]
    fn test_weights_must_be_numbers() {
        let doc = json!({
            "1": [{ "name": "Bomb Bag", "types": { "bombbag": "1.0" } }],
            "info": { "version": "v9" }
        });
        assert!(validate(&legacy(), &doc).is_err());
    }

    #[test]
    fn test_valid_items() {
        let doc = json!({
            "cardType": "bingo",
            "items": [{
                "id": "dodongo",
                "payload": { "name": "Dodongo", "jp": "ドドンゴ" },
                "difficulty": 3,
                "time": 1.5,
                "child": true,
                "types": {}
            }]
        });
        assert!(validate(&current(), &doc).is_ok());
    }

    #[test]
    fn test_items_field_types() {
        let doc = json!({
            "cardType": "bingo",
            "items": [{ "id": "dodongo", "child": "yes", "types": {} }]
        });
        let errors = validate(&current(), &doc).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_custom_schema_checks_structure_only() {
        let schema = Schema::new(
            "custom",
            vec![
                Column::boolean("child", &["child"]),
                Column::integer("difficulty", &["difficulty"]),
            ],
            DocumentLayout::Grouped {
                group_by: vec!["difficulty".to_string()],
                version: "v10".to_string(),
            },
            None,
            RowPolicy::default(),
        )
        .unwrap();

        let published = document_schema(&schema);
        let properties = published
            .pointer("/definitions/goal/properties")
            .and_then(Value::as_object)
            .unwrap();
        assert_eq!(properties.len(), 2);

        let doc = json!({ "1": [{ "child": true, "types": {} }], "info": { "version": "v10" } });
        assert!(validate(&published, &doc).is_ok());
        assert!(validate(&legacy(), &doc).is_err());
    }

    #[test]
    fn test_invalid_schema_reported() {
        let errors = validate(&json!({ "type": 12 }), &json!({})).unwrap_err();
        assert!(errors[0].starts_with("Invalid schema"));
    }

    #[test]
    fn test_validate_document_reports_errors() {
        let schema = Schema::legacy();
        let document = Document::Grouped {
            groups: Default::default(),
            info: crate::models::DocumentInfo {
                version: String::new(),
            },
        };
        match validate_document(&schema, &document) {
            Err(ConvertError::Validation { errors }) => assert!(!errors.is_empty()),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
