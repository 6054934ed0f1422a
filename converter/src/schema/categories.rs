//! Canonical synergy category order.
//!
//! The published column order used when writing goals back to CSV. Categories
//! missing from this list cannot be represented in tabular output.

use std::path::Path;

use crate::error::{ConvertError, ConvertResult};

/// Published category order, as agreed with the card generator.
pub const CANONICAL_CATEGORIES: [&str; 48] = [
    "childzl", "saria", "zl", "lightarrow", "claimcheck", "magic",
    "forest", "quiver", "pg", "gtunic", "dmc", "fire", "ice",
    "irons", "water", "longshot", "hovers", "shadow", "fortress",
    "gerudo", "gtg", "spirit", "deku", "ganon", "dc", "kd", "jabu",
    "lonlon", "childchu", "beans", "songs", "swords", "botw", "child2",
    "mapcompass", "hearts", "wallet", "strength", "bottle", "bulletbag",
    "bombbag", "nuts", "shields", "cow", "skullkid", "atrade", "boots", "tunics",
];

pub fn canonical_categories() -> Vec<String> {
    CANONICAL_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Parse a category list: either a JSON array of strings, or one name per
/// line (blank lines and `#` comments skipped).
pub fn parse_category_list(content: &str) -> Result<Vec<String>, serde_json::Error> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content);
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Load a category list from a file.
pub fn load_categories(path: &Path) -> ConvertResult<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    parse_category_list(&content).map_err(ConvertError::from)
}
