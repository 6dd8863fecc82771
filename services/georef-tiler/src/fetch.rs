//! Fetching the description and image over HTTP or from disk.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info, instrument};

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    /// `http://` and `https://` locations are URLs, anything else is a local path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::Path(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Plain HTTP GET client. Nothing is retried.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("georef-tiler/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    #[instrument(skip(self), fields(source = %source))]
    pub async fn fetch(&self, source: &Source) -> Result<Bytes> {
        let bytes = match source {
            Source::Url(url) => self.get(url).await?,
            Source::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        };
        info!(bytes = bytes.len(), "Fetched");
        Ok(bytes)
    }

    async fn get(&self, url: &str) -> Result<Bytes> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Server rejected request to {}", url))?;
        response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://example.org/c.json"),
            Source::Url("https://example.org/c.json".to_string())
        );
        assert_eq!(
            Source::parse("HTTP://example.org/c.json"),
            Source::Url("HTTP://example.org/c.json".to_string())
        );
        assert_eq!(
            Source::parse("data/canvas.json"),
            Source::Path(PathBuf::from("data/canvas.json"))
        );
    }

    #[test]
    fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, b"{}").unwrap();

        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let bytes = tokio_test::block_on(fetcher.fetch(&Source::Path(path))).unwrap();
        assert_eq!(&bytes[..], b"{}");
    }

    #[test]
    fn test_fetch_missing_file_names_path() {
        let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
        let err = tokio_test::block_on(fetcher.fetch(&Source::Path(PathBuf::from(
            "/nonexistent/canvas.json",
        ))))
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/canvas.json"));
    }
}
