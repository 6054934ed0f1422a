//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present); command-line flags override them.
//!
//! | Variable               | Default                    |
//! |------------------------|----------------------------|
//! | `GOALS_SHEET_URL`      | published sheet CSV export |
//! | `GOALS_CSV`            | `goals.csv`                |
//! | `GOALS_JSON`           | `goal-list.json`           |
//! | `GOALS_FORCE_DOWNLOAD` | `false`                    |
//! | `GOALS_SCHEMA`         | `legacy`                   |

use std::env;
use std::path::PathBuf;

const BASE_URL: &str = "https://docs.google.com/spreadsheet/ccc";
const SHEET_KEY: &str = "1dRpwfIV2vDRL_Hq-pBj3U7wq7XwZ9JPW9Ac8hK5qbgc";

pub const DEFAULT_CSV: &str = "goals.csv";
pub const DEFAULT_JSON: &str = "goal-list.json";
pub const DEFAULT_SCHEMA: &str = "legacy";

/// CSV export URL of the published goal sheet.
pub fn default_sheet_url() -> String {
    format!("{}?key={}&output=csv", BASE_URL, SHEET_KEY)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub sheet_url: String,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    /// Download even when a cached CSV exists
    pub force_download: bool,
    /// Built-in schema name or path to a schema file
    pub schema: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_url: default_sheet_url(),
            csv_path: PathBuf::from(DEFAULT_CSV),
            json_path: PathBuf::from(DEFAULT_JSON),
            force_download: false,
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup. Unset or empty values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            sheet_url: get("GOALS_SHEET_URL").unwrap_or(defaults.sheet_url),
            csv_path: get("GOALS_CSV").map(PathBuf::from).unwrap_or(defaults.csv_path),
            json_path: get("GOALS_JSON").map(PathBuf::from).unwrap_or(defaults.json_path),
            force_download: get("GOALS_FORCE_DOWNLOAD")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.force_download),
            schema: get("GOALS_SCHEMA").unwrap_or(defaults.schema),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
