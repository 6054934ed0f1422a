//! Sheet download.
//!
//! Fetches the published CSV export of the goal spreadsheet over HTTP. One
//! request per call; a non-success status is an error.

use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::logs::log_info;

/// Request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the spreadsheet export
#[derive(Clone)]
pub struct SheetFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl SheetFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download the raw body at `url`.
    pub async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        log_info(format!("Requesting {}", url));

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        log_info(format!("Received {} bytes", body.len()));
        Ok(body.to_vec())
    }
}

impl Default for SheetFetcher {
    fn default() -> Self {
        Self::new()
    }
}
