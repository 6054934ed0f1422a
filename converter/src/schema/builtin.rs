//! Built-in schemas for the goal sheet.
//!
//! - `legacy` - the v9 sheet: four flat columns, goals grouped by difficulty
//! - `current` - nested payload, typed columns, derived ids, `items` document

use super::{
    BlankRowPolicy, Column, DocumentLayout, ErrorPolicy, IdentifierRule, RowPolicy, Schema,
};

/// Names accepted by [`Schema::builtin`].
pub const BUILTIN_SCHEMAS: [&str; 2] = ["legacy", "current"];

impl Schema {
    /// Look up a built-in schema by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "legacy" => Some(Self::legacy()),
            "current" => Some(Self::current()),
            _ => None,
        }
    }

    /// The v9 sheet: `name, jp, difficulty, child`, then synergies.
    ///
    /// Blank rows and bad rows are skipped with a diagnostic.
    pub fn legacy() -> Self {
        Schema::new(
            "legacy",
            vec![
                Column::string("name", &["name"]),
                Column::string("jp", &["jp"]),
                Column::integer("difficulty", &["difficulty"]),
                Column::string("child", &["child"]),
            ],
            DocumentLayout::Grouped {
                group_by: vec!["difficulty".to_string()],
                version: "v9".to_string(),
            },
            None,
            RowPolicy {
                blank_rows: BlankRowPolicy::Skip,
                on_error: ErrorPolicy::Skip,
            },
        )
        .expect("built-in legacy schema is valid")
    }

    /// The current sheet with typed columns and a nested payload.
    ///
    /// The first blank row ends the data and any bad row aborts the run.
    pub fn current() -> Self {
        Schema::new(
            "current",
            vec![
                Column::string("name", &["payload", "name"]),
                Column::string("jp", &["payload", "jp"]),
                Column::integer("difficulty", &["difficulty"]),
                Column::float("time", &["time"]),
                Column::string("skill", &["skill"]),
                Column::boolean("child", &["child"]),
                Column::boolean("bottle", &["bottle"]),
                Column::boolean("hookshot", &["hookshot"]),
                Column::ignored("notes"),
            ],
            DocumentLayout::Items {
                card_type: "bingo".to_string(),
            },
            Some(IdentifierRule {
                target: vec!["id".to_string()],
                source: vec!["payload".to_string(), "name".to_string()],
            }),
            RowPolicy {
                blank_rows: BlankRowPolicy::Terminate,
                on_error: ErrorPolicy::Abort,
            },
        )
        .expect("built-in current schema is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_resolve() {
        for name in BUILTIN_SCHEMAS {
            let schema = Schema::builtin(name).unwrap();
            assert_eq!(schema.name(), name);
        }
        assert!(Schema::builtin("v1").is_none());
    }

    #[test]
    fn test_legacy_headers() {
        assert_eq!(
            Schema::legacy().headers(),
            vec!["name", "jp", "difficulty", "child"]
        );
        assert!(Schema::legacy().group_column().is_some());
    }

    #[test]
    fn test_current_policies() {
        let rows = Schema::current().rows();
        assert_eq!(rows.blank_rows, BlankRowPolicy::Terminate);
        assert_eq!(rows.on_error, ErrorPolicy::Abort);
        assert_eq!(Schema::current().width(), 9);
    }
}
