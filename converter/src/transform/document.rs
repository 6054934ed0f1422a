//! Document assembler.
//!
//! Wraps decoded records into the published document and flattens a document
//! back into `(group, record)` pairs for CSV output. The schema's layout picks
//! the shape; one shape per schema, never mixed.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ShapeError;
use crate::models::{Document, DocumentInfo, GoalRecord};
use crate::schema::{DocumentLayout, Schema};

/// Key of the metadata entry in grouped documents.
pub const INFO_KEY: &str = "info";

/// A flattened record and the bucket key it came from (grouped documents only).
pub type FlatRecord = (Option<String>, GoalRecord);

/// Legacy group keys are non-empty runs of ASCII digits.
pub fn is_group_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Wrap records into the schema's document shape.
///
/// For grouped layouts the grouping field is moved out of each record and
/// becomes its bucket key.
pub fn assemble(schema: &Schema, records: Vec<GoalRecord>) -> Result<Document, ShapeError> {
    match schema.layout() {
        DocumentLayout::Grouped { group_by, version } => {
            let mut groups: BTreeMap<String, Vec<GoalRecord>> = BTreeMap::new();
            for (index, mut record) in records.into_iter().enumerate() {
                let key = match record.take(group_by) {
                    Some(Value::String(s)) if is_group_key(&s) => s,
                    Some(Value::Number(n)) if is_group_key(&n.to_string()) => n.to_string(),
                    other => {
                        return Err(ShapeError::InvalidRecord {
                            location: format!("#{}", index),
                            message: format!(
                                "group field '{}' is {}",
                                group_by.join("."),
                                other.map_or("missing".to_string(), |v| v.to_string())
                            ),
                        })
                    }
                };
                groups.entry(key).or_default().push(record);
            }
            Ok(Document::Grouped {
                groups,
                info: DocumentInfo {
                    version: version.clone(),
                },
            })
        }
        DocumentLayout::Items { card_type } => Ok(Document::Items {
            card_type: card_type.clone(),
            items: records,
        }),
    }
}

/// Flatten a document into records in output order.
///
/// Grouped documents are walked in ascending numeric key order; each bucket
/// keeps its internal order.
pub fn flatten(schema: &Schema, document: &Document) -> Result<Vec<FlatRecord>, ShapeError> {
    match (schema.layout(), document) {
        (DocumentLayout::Grouped { .. }, Document::Grouped { groups, .. }) => {
            let mut keys: Vec<&String> = groups.keys().filter(|k| is_group_key(k)).collect();
            keys.sort_by(|a, b| numeric_order(a).cmp(&numeric_order(b)));

            Ok(keys
                .into_iter()
                .flat_map(|key| {
                    groups[key]
                        .iter()
                        .map(move |record| (Some(key.clone()), record.clone()))
                })
                .collect())
        }
        (DocumentLayout::Items { .. }, Document::Items { items, .. }) => {
            Ok(items.iter().map(|record| (None, record.clone())).collect())
        }
        _ => Err(ShapeError::LayoutMismatch {
            schema: schema.name().to_string(),
        }),
    }
}

/// Sort key comparing digit strings by numeric value without parsing.
fn numeric_order(key: &str) -> (usize, &str, &str) {
    let significant = key.trim_start_matches('0');
    (significant.len(), significant, key)
}

/// Read a JSON document in the schema's shape.
pub fn parse_document(schema: &Schema, value: Value) -> Result<Document, ShapeError> {
    let Value::Object(mut root) = value else {
        return Err(ShapeError::NotAnObject);
    };

    match schema.layout() {
        DocumentLayout::Grouped { .. } => {
            let info = root
                .remove(INFO_KEY)
                .ok_or_else(|| ShapeError::MissingKey(INFO_KEY.to_string()))?;
            let info: DocumentInfo = serde_json::from_value(info)
                .map_err(|_| ShapeError::MissingKey(format!("{}.version", INFO_KEY)))?;

            let mut groups = BTreeMap::new();
            for (key, value) in root {
                if !is_group_key(&key) {
                    continue;
                }
                let Value::Array(entries) = value else {
                    return Err(ShapeError::InvalidGroup(key));
                };
                let records = parse_records(entries, &key)?;
                groups.insert(key, records);
            }
            Ok(Document::Grouped { groups, info })
        }
        DocumentLayout::Items { .. } => {
            let card_type = match root.remove("cardType") {
                Some(Value::String(s)) => s,
                _ => return Err(ShapeError::MissingKey("cardType".to_string())),
            };
            let items = match root.remove("items") {
                Some(Value::Array(entries)) => parse_records(entries, "items")?,
                Some(_) => return Err(ShapeError::InvalidGroup("items".to_string())),
                None => return Err(ShapeError::MissingKey("items".to_string())),
            };
            Ok(Document::Items { card_type, items })
        }
    }
}

fn parse_records(entries: Vec<Value>, group: &str) -> Result<Vec<GoalRecord>, ShapeError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_object() {
                return Err(ShapeError::InvalidRecord {
                    location: format!("{}[{}]", group, index),
                    message: "not a JSON object".to_string(),
                });
            }
            serde_json::from_value(entry).map_err(|e| ShapeError::InvalidRecord {
                location: format!("{}[{}]", group, index),
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::row::{decode_row, synergy_header};
    use serde_json::json;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn legacy_records(rows: &[&[&str]]) -> Vec<GoalRecord> {
        let schema = Schema::legacy();
        let header = strings(&["name", "jp", "difficulty", "child", "fire", "ice"]);
        let synergies = synergy_header(&schema, &header).unwrap();
        rows.iter()
            .map(|row| decode_row(&schema, &synergies, *row).unwrap())
            .collect()
    }

    #[test]
    fn test_assemble_groups_by_difficulty() {
        let records = legacy_records(&[
            &["Dodongo", "ドドンゴ", "3", "true", "1.0", "*0.5"],
            &["Bomb Bag", "", "10", "false", "", ""],
            &["Barinade", "バリネード", "3", "true", "", "2"],
        ]);
        let document = assemble(&Schema::legacy(), records).unwrap();
        let value = document.to_value().unwrap();

        assert_eq!(
            value["3"][0],
            json!({
                "name": "Dodongo",
                "jp": "ドドンゴ",
                "child": "true",
                "types": {"fire": 1.0},
                "subtypes": {"ice": 0.5}
            })
        );
        assert_eq!(value["3"][1]["name"], "Barinade");
        assert_eq!(value["10"][0]["types"], json!({}));
        assert!(value["10"][0].get("subtypes").is_none());
        assert_eq!(value["info"], json!({"version": "v9"}));
    }

    #[test]
    fn test_assemble_rejects_non_digit_group() {
        let mut record = GoalRecord::new();
        record.fields.insert("difficulty".into(), json!(-1));
        let err = assemble(&Schema::legacy(), vec![record]).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidRecord { .. }));
    }

    #[test]
    fn test_assemble_keeps_padded_key() {
        let records = legacy_records(&[
            &["Three", "", "3", "true", "", ""],
            &["Padded", "", "03", "true", "", ""],
        ]);
        let document = assemble(&Schema::legacy(), records).unwrap();
        let value = document.to_value().unwrap();
        assert_eq!(value["3"][0]["name"], "Three");
        assert_eq!(value["03"][0]["name"], "Padded");
    }

    #[test]
    fn test_assemble_items_keeps_order() {
        let schema = Schema::current();
        let mut first = GoalRecord::new();
        first.fields.insert("id".into(), json!("b"));
        let mut second = GoalRecord::new();
        second.fields.insert("id".into(), json!("a"));

        let document = assemble(&schema, vec![first, second]).unwrap();
        let value = document.to_value().unwrap();

        assert_eq!(value["cardType"], "bingo");
        assert_eq!(value["items"][0]["id"], "b");
        assert_eq!(value["items"][1]["id"], "a");
    }

    #[test]
    fn test_flatten_skips_metadata_and_sorts_numerically() {
        let value = json!({
            "info": {"version": "v9"},
            "10": [{"name": "ten", "types": {}}],
            "2": [{"name": "two-a", "types": {}}, {"name": "two-b", "types": {}}],
            "notes": [{"name": "not a group", "types": {}}]
        });
        let schema = Schema::legacy();
        let document = parse_document(&schema, value).unwrap();
        let flat = flatten(&schema, &document).unwrap();

        let names: Vec<(Option<String>, String)> = flat
            .iter()
            .map(|(key, record)| {
                (key.clone(), record.fields["name"].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(
            names,
            vec![
                (Some("2".to_string()), "two-a".to_string()),
                (Some("2".to_string()), "two-b".to_string()),
                (Some("10".to_string()), "ten".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_grouped_requires_info() {
        let err = parse_document(&Schema::legacy(), json!({"3": []})).unwrap_err();
        assert_eq!(err, ShapeError::MissingKey("info".to_string()));
    }

    #[test]
    fn test_parse_grouped_rejects_non_array_group() {
        let value = json!({"info": {"version": "v9"}, "3": {"name": "Dodongo"}});
        let err = parse_document(&Schema::legacy(), value).unwrap_err();
        assert_eq!(err, ShapeError::InvalidGroup("3".to_string()));
    }

    #[test]
    fn test_parse_items_requires_keys() {
        let schema = Schema::current();
        assert_eq!(
            parse_document(&schema, json!({"items": []})).unwrap_err(),
            ShapeError::MissingKey("cardType".to_string())
        );
        assert_eq!(
            parse_document(&schema, json!({"cardType": "bingo"})).unwrap_err(),
            ShapeError::MissingKey("items".to_string())
        );
        assert_eq!(
            parse_document(&schema, json!([])).unwrap_err(),
            ShapeError::NotAnObject
        );
    }

    #[test]
    fn test_parse_rejects_bad_record() {
        let value = json!({"cardType": "bingo", "items": [{"types": {"fire": "hot"}}]});
        let err = parse_document(&Schema::current(), value).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidRecord { .. }));
    }

    #[test]
    fn test_flatten_layout_mismatch() {
        let document = Document::Items {
            card_type: "bingo".into(),
            items: vec![],
        };
        assert!(matches!(
            flatten(&Schema::legacy(), &document),
            Err(ShapeError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_subtypes_survive_document_round_trip() {
        let records = legacy_records(&[&["Dodongo", "ドドンゴ", "3", "true", "1.0", "*0.5"]]);
        let schema = Schema::legacy();
        let document = assemble(&schema, records).unwrap();

        let reparsed = parse_document(&schema, document.to_value().unwrap()).unwrap();
        let flat = flatten(&schema, &reparsed).unwrap();
        assert_eq!(flat[0].1.subtypes.get("ice"), Some(&0.5));
        assert_eq!(flat[0].1.subtypes.len(), 1);
        assert_eq!(reparsed, document);
    }

    #[test]
    fn test_is_group_key() {
        assert!(is_group_key("3"));
        assert!(is_group_key("025"));
        assert!(!is_group_key("info"));
        assert!(!is_group_key(""));
        assert!(!is_group_key("-1"));
    }
}
