//! Remote catalog source
//!
//! A [`CatalogSource`] yields the raw CSV text of the catalog. [`HttpSource`]
//! downloads it from a published spreadsheet export URL.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::info;

/// CSV export of the published product sheet
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTwZ_BgnXtX_ZdO87jkvLU_IMUByJwFKZoyzVVI0Sghwe-2_Qq676JsqsrO0AnGubJGuCxonKizijyj/pub?gid=0&single=true&output=csv";

/// Errors that can occur when fetching catalog text
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server responded with status {0}")]
    Status(StatusCode),
}

/// Provider of raw catalog text
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the full CSV text of the catalog
    async fn fetch_text(&self) -> Result<String, FetchError>;
}

/// Fetches catalog CSV over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_URL)
    }
}

impl HttpSource {
    /// Creates a source for the given export URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    /// Creates a source with a custom HTTP client
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpSource {
    async fn fetch_text(&self) -> Result<String, FetchError> {
        info!(url = %self.url, "fetching catalog");

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_published_sheet() {
        let source = HttpSource::default();
        assert!(source.url().contains("docs.google.com"));
        assert!(source.url().ends_with("output=csv"));
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status(StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("404"));
    }
}
