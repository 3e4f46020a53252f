//! In-memory stand-ins for the reader and fetch collaborators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vx_common::{FetchError, Fetcher, FieldHeader, FieldReader, FieldSelector, RawField, ReadError};

#[derive(Debug, Clone)]
enum Source {
    Fields(Vec<RawField>),
    Malformed,
}

/// A [`FieldReader`] over sources held in memory, keyed by path.
///
/// Unknown paths are unavailable. A per-path delay makes completion order
/// differ from submission order under concurrency.
#[derive(Debug, Default)]
pub struct MemoryReader {
    sources: Mutex<HashMap<PathBuf, Source>>,
    delays: Mutex<HashMap<PathBuf, Duration>>,
    reads: AtomicUsize,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field` to the source at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, field: RawField) {
        let mut sources = self.sources.lock().unwrap();
        match sources
            .entry(path.into())
            .or_insert_with(|| Source::Fields(Vec::new()))
        {
            Source::Fields(fields) => fields.push(field),
            Source::Malformed => {}
        }
    }

    /// Make the source at `path` undecodable.
    pub fn insert_malformed(&self, path: impl Into<PathBuf>) {
        self.sources
            .lock()
            .unwrap()
            .insert(path.into(), Source::Malformed);
    }

    /// Remove the source at `path` entirely.
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.sources.lock().unwrap().remove(path.as_ref());
    }

    /// Delay every read of `path`.
    pub fn set_delay(&self, path: impl Into<PathBuf>, delay: Duration) {
        self.delays.lock().unwrap().insert(path.into(), delay);
    }

    /// Number of `read_field` calls served.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn open(&self, path: &Path) -> Result<Vec<RawField>, ReadError> {
        let delay = self.delays.lock().unwrap().get(path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let source = self.sources.lock().unwrap().get(path).cloned();
        match source {
            Some(Source::Fields(fields)) => Ok(fields),
            Some(Source::Malformed) => Err(ReadError::Malformed(format!(
                "{}: not a GRIB2 file",
                path.display()
            ))),
            None => Err(ReadError::Unavailable(format!(
                "{}: No such file or directory",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl FieldReader for MemoryReader {
    async fn list_fields(&self, path: &Path) -> Result<Vec<FieldHeader>, ReadError> {
        Ok(self
            .open(path)
            .await?
            .into_iter()
            .map(|f| f.header)
            .collect())
    }

    async fn read_field(
        &self,
        path: &Path,
        selector: &FieldSelector,
    ) -> Result<Option<RawField>, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .open(path)
            .await?
            .into_iter()
            .find(|f| f.header.matches(selector)))
    }
}

/// A [`Fetcher`] resolving known URLs to fixed local paths.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    urls: HashMap<String, PathBuf>,
    fetches: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: &str, path: impl Into<PathBuf>) -> Self {
        self.urls.insert(url.to_string(), path.into());
        self
    }

    /// Number of `fetch` calls served.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<PathBuf, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.urls
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_field;
    use vx_common::{Level, LevelType};

    fn selector(level: f64) -> FieldSelector {
        FieldSelector {
            short_name: "gh".to_string(),
            level_type: LevelType::IsobaricInhPa,
            level: Some(Level(level)),
        }
    }

    #[test]
    fn test_memory_reader() {
        let reader = MemoryReader::new();
        reader.insert("/a", raw_field("gh", LevelType::IsobaricInhPa, Some(900.0), 2, 2, 1.0));

        let found = tokio_test::block_on(reader.read_field(Path::new("/a"), &selector(900.0))).unwrap();
        assert!(found.is_some());

        let missing = tokio_test::block_on(reader.read_field(Path::new("/a"), &selector(500.0))).unwrap();
        assert!(missing.is_none());

        let err = tokio_test::block_on(reader.read_field(Path::new("/b"), &selector(900.0))).unwrap_err();
        assert!(matches!(err, ReadError::Unavailable(_)));
        assert_eq!(reader.reads(), 3);
    }

    #[test]
    fn test_static_fetcher() {
        let fetcher = StaticFetcher::new().with_url("https://x/a", "/a");
        assert_eq!(tokio_test::block_on(fetcher.fetch("https://x/a")).unwrap(), PathBuf::from("/a"));
        assert!(matches!(
            tokio_test::block_on(fetcher.fetch("https://x/b")),
            Err(FetchError::NotFound(_))
        ));
    }
}
