//! Contract for the remote-fetch collaborator.

use std::path::PathBuf;

use async_trait::async_trait;

/// Errors raised while making a remote source locally readable.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("remote source not found: {0}")]
    NotFound(String),

    #[error("fetch failed for {url}: {reason}")]
    Failed { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve a URL to a local, readable file.
///
/// Retry and caching policy belong to the implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PathBuf, FetchError>;
}
