//! Sheet cache - keep the downloaded CSV on disk and reuse it
//!
//! The CSV is stored verbatim at a fixed path. A JSON sidecar next to it
//! (`<csv>.meta.json`) records where and when it was fetched.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FetchError, FetchResult};
use crate::fetch::SheetFetcher;
use crate::logs::{log_info, log_success};
use crate::parser::decode_utf8;

/// Suffix appended to the CSV file name for the metadata sidecar
const META_SUFFIX: &str = ".meta.json";

/// What is known about the cached download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMetadata {
    /// URL the sheet was downloaded from
    pub source_url: String,
    /// Download time (RFC 3339, UTC)
    pub fetched_at: String,
    /// Size of the stored file
    pub bytes: usize,
}

/// Where the returned sheet text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetOrigin {
    Cache,
    Download,
}

/// Sheet text ready for conversion
#[derive(Debug, Clone)]
pub struct CachedSheet {
    pub text: String,
    pub origin: SheetOrigin,
}

/// Local copy of the goal sheet
pub struct SheetCache {
    csv_path: PathBuf,
    meta_path: PathBuf,
}

impl SheetCache {
    pub fn new(csv_path: impl AsRef<Path>) -> Self {
        let csv_path = csv_path.as_ref().to_path_buf();
        let mut meta = csv_path.clone().into_os_string();
        meta.push(META_SUFFIX);
        Self {
            csv_path,
            meta_path: PathBuf::from(meta),
        }
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    pub fn exists(&self) -> bool {
        self.csv_path.exists()
    }

    /// Read the cached sheet, `None` if nothing is cached yet.
    pub async fn read_cached(&self) -> FetchResult<Option<String>> {
        if !self.exists() {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&self.csv_path).await?;
        decode_utf8(&bytes)
            .map(Some)
            .ok_or_else(|| FetchError::Encoding(self.csv_path.display().to_string()))
    }

    /// Store downloaded bytes verbatim, then the metadata sidecar.
    ///
    /// Bytes that are not UTF-8 are rejected before anything is written. If the
    /// sidecar cannot be written the CSV is removed again.
    pub async fn store(&self, source_url: &str, bytes: &[u8]) -> FetchResult<String> {
        let text = decode_utf8(bytes).ok_or_else(|| FetchError::Encoding(source_url.to_string()))?;

        let metadata = SheetMetadata {
            source_url: source_url.to_string(),
            fetched_at: Utc::now().to_rfc3339(),
            bytes: bytes.len(),
        };
        let json = serde_json::to_string_pretty(&metadata)?;

        if let Some(parent) = self.csv_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.csv_path, bytes).await?;

        if let Err(e) = tokio::fs::write(&self.meta_path, json).await {
            let _ = tokio::fs::remove_file(&self.csv_path).await;
            return Err(e.into());
        }

        Ok(text)
    }

    /// Metadata of the cached download, if a readable sidecar exists.
    pub async fn info(&self) -> Option<SheetMetadata> {
        let content = tokio::fs::read_to_string(&self.meta_path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Return the cached sheet, downloading it first if it is missing or
    /// `force` is set.
    pub async fn ensure(
        &self,
        fetcher: &SheetFetcher,
        url: &str,
        force: bool,
    ) -> FetchResult<CachedSheet> {
        if !force {
            if let Some(text) = self.read_cached().await? {
                log_info(format!("Using existing \"{}\"", self.csv_path.display()));
                return Ok(CachedSheet {
                    text,
                    origin: SheetOrigin::Cache,
                });
            }
        }

        log_info("Downloading goal sheet");
        let bytes = fetcher.fetch(url).await?;
        let text = self.store(url, &bytes).await?;
        log_success(format!("Goal sheet saved to \"{}\"", self.csv_path.display()));

        Ok(CachedSheet {
            text,
            origin: SheetOrigin::Download,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHEET: &str = "name,jp,difficulty,child,fire\nDodongo,ドドンゴ,3,true,1.0\n";

    #[test]
    fn test_meta_path() {
        let cache = SheetCache::new("data/goals.csv");
        assert_eq!(cache.meta_path(), Path::new("data/goals.csv.meta.json"));
    }

    #[tokio::test]
    async fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        let cache = SheetCache::new(dir.path().join("goals.csv"));
        assert!(cache.read_cached().await.unwrap().is_none());
        assert!(cache.info().await.is_none());
    }

    #[tokio::test]
    async fn test_store_and_read() {
        let dir = TempDir::new().unwrap();
        let cache = SheetCache::new(dir.path().join("nested").join("goals.csv"));

        let text = cache.store("https://example.test/sheet", SHEET.as_bytes()).await.unwrap();
        assert_eq!(text, SHEET);
        assert_eq!(cache.read_cached().await.unwrap().as_deref(), Some(SHEET));

        let meta = cache.info().await.unwrap();
        assert_eq!(meta.source_url, "https://example.test/sheet");
        assert_eq!(meta.bytes, SHEET.len());
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.fetched_at).is_ok());
    }

    #[tokio::test]
    async fn test_store_rejects_non_utf8() {
        let dir = TempDir::new().unwrap();
        let cache = SheetCache::new(dir.path().join("goals.csv"));

        let err = cache.store("https://example.test/sheet", &[0x53, 0xE9, 0x74]).await.unwrap_err();
        assert!(matches!(err, FetchError::Encoding(_)));
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn test_ensure_uses_cache_without_download() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goals.csv");
        std::fs::write(&path, SHEET).unwrap();

        let cache = SheetCache::new(&path);
        // The URL is never requested while a cached copy exists.
        let sheet = cache
            .ensure(&SheetFetcher::new(), "not a url", false)
            .await
            .unwrap();
        assert_eq!(sheet.origin, SheetOrigin::Cache);
        assert_eq!(sheet.text, SHEET);
    }

    #[tokio::test]
    async fn test_ensure_force_downloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goals.csv");
        std::fs::write(&path, SHEET).unwrap();

        let cache = SheetCache::new(&path);
        let err = cache
            .ensure(&SheetFetcher::new(), "not a url", true)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SHEET);
    }

    #[tokio::test]
    async fn test_failed_sidecar_removes_csv() {
        let dir = TempDir::new().unwrap();
        let cache = SheetCache::new(dir.path().join("goals.csv"));
        std::fs::create_dir(cache.meta_path()).unwrap();

        assert!(cache.store("https://example.test/sheet", SHEET.as_bytes()).await.is_err());
        assert!(!cache.exists());
        assert!(cache.read_cached().await.unwrap().is_none());
    }
}
