//! HTTP fetch collaborator with retry and a local download cache.
//!
//! Remote sources are downloaded once into `<workdir>/downloads/` and reused
//! on later requests. Concurrent requests for one URL share a single
//! download. Each attempt writes its own `.partial` file, renamed into place
//! once complete.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use vx_common::{FetchError, Fetcher};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial retry delay (doubles each retry)
    pub initial_retry_delay: Duration,
    /// Maximum retry delay
    pub max_retry_delay: Duration,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Directory for completed downloads
    pub download_dir: PathBuf,
}

impl FetchConfig {
    pub fn for_workdir(workdir: &Path) -> Self {
        Self {
            download_dir: workdir.join("downloads"),
            ..Default::default()
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay: Duration::from_secs(2),
            max_retry_delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(300),
            download_dir: PathBuf::from("downloads"),
        }
    }
}

/// Why one download attempt failed.
enum Attempt {
    /// Not worth retrying
    Fatal(FetchError),
    Retry(String),
}

/// Downloads remote sources with `reqwest`.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
    /// One lock per URL; held for the whole download
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    attempts: AtomicUsize,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            config,
            in_flight: Mutex::new(HashMap::new()),
            attempts: AtomicUsize::new(0),
        })
    }

    /// Number of download attempts made, cache hits excluded.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn url_lock(&self, url: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(in_flight.entry(url.to_string()).or_default())
    }

    /// Where `url` is cached.
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.config.download_dir.join(sanitize_filename(url))
    }

    async fn attempt(&self, url: &str, temp_path: &Path) -> Result<(), Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Attempt::Retry(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(Attempt::Fatal(FetchError::NotFound(url.to_string())))
            }
            status if status.is_server_error() => {
                return Err(Attempt::Retry(format!("HTTP error: {}", status)))
            }
            status => {
                return Err(Attempt::Fatal(FetchError::Failed {
                    url: url.to_string(),
                    reason: format!("HTTP error: {}", status),
                }))
            }
        }

        let mut file = File::create(temp_path)
            .await
            .map_err(|e| Attempt::Fatal(e.into()))?;

        let mut stream = response.bytes_stream();
        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Attempt::Retry(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Attempt::Fatal(e.into()))?;
            bytes += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| Attempt::Fatal(e.into()))?;
        file.sync_all().await.map_err(|e| Attempt::Fatal(e.into()))?;

        debug!(bytes, "Response body written");
        Ok(())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<PathBuf, FetchError> {
        let final_path = self.cache_path(url);

        if fs::try_exists(&final_path).await? {
            debug!(path = %final_path.display(), "Using cached download");
            return Ok(final_path);
        }

        let lock = self.url_lock(url);
        let _guard = lock.lock().await;

        // Another task may have finished the download while we waited.
        if fs::try_exists(&final_path).await? {
            debug!(path = %final_path.display(), "Using download completed by another task");
            return Ok(final_path);
        }

        fs::create_dir_all(&self.config.download_dir).await?;

        let mut retry_count = 0;
        let mut delay = self.config.initial_retry_delay;

        loop {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            let temp_path = self.config.download_dir.join(format!(
                "{}.{}.partial",
                sanitize_filename(url),
                attempt
            ));
            match self.attempt(url, &temp_path).await {
                Ok(()) => {
                    fs::rename(&temp_path, &final_path).await?;
                    info!(path = %final_path.display(), "Download completed");
                    return Ok(final_path);
                }
                Err(Attempt::Fatal(e)) => {
                    fs::remove_file(&temp_path).await.ok();
                    return Err(e);
                }
                Err(Attempt::Retry(reason)) => {
                    retry_count += 1;
                    fs::remove_file(&temp_path).await.ok();

                    if retry_count > self.config.max_retries {
                        return Err(FetchError::Failed {
                            url: url.to_string(),
                            reason: format!("failed after {} retries: {}", retry_count - 1, reason),
                        });
                    }

                    warn!(
                        error = %reason,
                        retry = retry_count,
                        max_retries = self.config.max_retries,
                        delay_secs = delay.as_secs(),
                        "Download failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.config.max_retry_delay);
                }
            }
        }
    }
}

/// Flatten a URL into a single file name.
pub fn sanitize_filename(url: &str) -> String {
    let trimmed = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    trimmed
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
