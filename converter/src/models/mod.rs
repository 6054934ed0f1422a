//! Domain models for the goal list.
//!
//! - [`GoalRecord`] - one published goal: schema fields, `types` and `subtypes`
//! - [`Document`] - the published artifact, in legacy or current shape
//! - [`DocumentInfo`] - metadata entry of the legacy shape

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::SchemaConfigError;

/// Category name -> synergy weight.
pub type WeightMap = BTreeMap<String, f64>;

// =============================================================================
// Goal Record
// =============================================================================

/// One published goal.
///
/// Scalar fields live in a generic tree of JSON objects so that any schema,
/// flat or nested, can place values without a fixed struct. `types` is always
/// serialized; `subtypes` only when it has at least one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalRecord {
    /// Schema-declared fields (possibly nested objects).
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    /// Primary synergy weights.
    #[serde(default)]
    pub types: WeightMap,

    /// Secondary synergy weights (`*`-marked cells).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subtypes: WeightMap,
}

impl GoalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at `path`, walking nested objects.
    pub fn get(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.fields.get(first)?, |value, segment| {
                value.as_object()?.get(segment)
            })
    }

    /// String value at `path`, if the field exists and is a string.
    pub fn get_str(&self, path: &[String]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Assign `value` at `path`, creating intermediate objects on demand.
    ///
    /// Fails instead of replacing a non-object intermediate, or an object
    /// sitting where the leaf should go.
    pub fn set(&mut self, path: &[String], value: Value) -> Result<(), SchemaConfigError> {
        let Some((leaf, parents)) = path.split_last() else {
            return Err(SchemaConfigError::EmptyPath {
                column: String::new(),
            });
        };

        let parent = ensure_path(&mut self.fields, parents, path)?;
        if let Some(Value::Object(_)) = parent.get(leaf) {
            return Err(SchemaConfigError::PathConflict {
                path: path.join("."),
                other: format!("{} (object)", path.join(".")),
            });
        }
        parent.insert(leaf.clone(), value);
        Ok(())
    }

    /// Remove and return the value at `path`. Intermediate objects are kept.
    pub fn take(&mut self, path: &[String]) -> Option<Value> {
        let (leaf, parents) = path.split_last()?;
        let mut map = &mut self.fields;
        for segment in parents {
            map = map.get_mut(segment)?.as_object_mut()?;
        }
        map.remove(leaf)
    }
}

/// Walk `parents` below `map`, inserting empty objects where nothing exists.
fn ensure_path<'a>(
    map: &'a mut Map<String, Value>,
    parents: &[String],
    full_path: &[String],
) -> Result<&'a mut Map<String, Value>, SchemaConfigError> {
    let Some((head, rest)) = parents.split_first() else {
        return Ok(map);
    };

    let entry = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));

    match entry {
        Value::Object(child) => ensure_path(child, rest, full_path),
        _ => {
            let depth = full_path.len() - parents.len();
            Err(SchemaConfigError::PathConflict {
                path: full_path.join("."),
                other: full_path[..depth].join("."),
            })
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// Metadata entry of the legacy grouped document (`"info"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub version: String,
}

/// The published goal list.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Legacy shape: `{"<difficulty>": [record, ...], "info": {"version": ...}}`.
    Grouped {
        groups: BTreeMap<String, Vec<GoalRecord>>,
        info: DocumentInfo,
    },

    /// Current shape: `{"cardType": ..., "items": [record, ...]}`.
    Items {
        card_type: String,
        items: Vec<GoalRecord>,
    },
}

impl Document {
    /// Total number of records across all groups.
    pub fn record_count(&self) -> usize {
        match self {
            Document::Grouped { groups, .. } => groups.values().map(Vec::len).sum(),
            Document::Items { items, .. } => items.len(),
        }
    }

    /// Convert to a JSON value. Object keys come out sorted.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut root = Map::new();
        match self {
            Document::Grouped { groups, info } => {
                for (key, records) in groups {
                    root.insert(key.clone(), serde_json::to_value(records)?);
                }
                root.insert("info".to_string(), serde_json::to_value(info)?);
            }
            Document::Items { card_type, items } => {
                root.insert("cardType".to_string(), Value::String(card_type.clone()));
                root.insert("items".to_string(), serde_json::to_value(items)?);
            }
        }
        Ok(Value::Object(root))
    }
}
