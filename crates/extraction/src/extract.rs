//! Field extraction: locator + selector → raw field.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use vx_common::{FieldReader, FieldSelector, Fetcher, Level, RawField, ReadError};

use crate::error::JobFailure;
use crate::locator::Locator;

/// Opens sources through the reader collaborator, fetching remote ones first.
///
/// Holds no per-call state; one extractor is shared by every worker.
#[derive(Clone)]
pub struct FieldExtractor {
    reader: Arc<dyn FieldReader>,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl FieldExtractor {
    /// An extractor for local sources only.
    pub fn new(reader: Arc<dyn FieldReader>) -> Self {
        Self {
            reader,
            fetcher: None,
        }
    }

    /// Use `fetcher` to make remote locators readable.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Read the field matching `selector` from `locator`.
    pub async fn extract(
        &self,
        locator: &Locator,
        selector: &FieldSelector,
    ) -> Result<RawField, JobFailure> {
        let path = self.local_path(locator).await?;

        let found = self
            .reader
            .read_field(&path, selector)
            .await
            .map_err(|e| read_failure(locator, e))?;

        match found {
            Some(field) if field.is_consistent() => {
                debug!(locator = %locator, short_name = %selector.short_name, "Field read");
                Ok(field)
            }
            Some(field) => Err(JobFailure::MalformedSource(format!(
                "{}: {} values, {} latitudes, {} longitudes for a {}x{} grid",
                locator,
                field.values.len(),
                field.latitude.len(),
                field.longitude.len(),
                field.shape.ny,
                field.shape.nx
            ))),
            None => Err(self.classify_absence(locator, &path, selector).await),
        }
    }

    async fn local_path(&self, locator: &Locator) -> Result<PathBuf, JobFailure> {
        match locator {
            Locator::Path(path) => Ok(path.clone()),
            Locator::Url(url) => {
                let fetcher = self.fetcher.as_ref().ok_or_else(|| {
                    JobFailure::SourceUnavailable(format!("{}: no fetcher for remote source", url))
                })?;
                fetcher
                    .fetch(url)
                    .await
                    .map_err(|e| JobFailure::SourceUnavailable(format!("{}: {}", url, e)))
            }
        }
    }

    /// Distinguish a missing level from a missing variable.
    async fn classify_absence(
        &self,
        locator: &Locator,
        path: &std::path::Path,
        selector: &FieldSelector,
    ) -> JobFailure {
        let described = describe(selector);

        let headers = match self.reader.list_fields(path).await {
            Ok(headers) => headers,
            Err(e) => return read_failure(locator, e),
        };

        let mut available: Vec<Level> = headers
            .iter()
            .filter(|h| h.same_variable(selector))
            .filter_map(|h| h.level)
            .collect();

        if available.is_empty() {
            return JobFailure::NotFound(format!("{} in {}", described, locator));
        }

        available.sort();
        available.dedup();
        JobFailure::LevelMismatch {
            selector: described,
            available: available
                .iter()
                .map(Level::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn read_failure(locator: &Locator, err: ReadError) -> JobFailure {
    match err {
        ReadError::Unavailable(reason) => {
            JobFailure::SourceUnavailable(format!("{}: {}", locator, reason))
        }
        ReadError::Malformed(reason) => JobFailure::MalformedSource(format!("{}: {}", locator, reason)),
    }
}

fn describe(selector: &FieldSelector) -> String {
    match selector.level {
        Some(level) => format!("{}@{} {}", selector.short_name, selector.level_type, level),
        None => format!("{}@{}", selector.short_name, selector.level_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{raw_field, MemoryReader, StaticFetcher};
    use vx_common::LevelType;

    fn selector(level: Option<f64>) -> FieldSelector {
        FieldSelector {
            short_name: "gh".to_string(),
            level_type: LevelType::IsobaricInhPa,
            level: level.map(Level),
        }
    }

    fn reader() -> Arc<MemoryReader> {
        let reader = MemoryReader::new();
        reader.insert(
            "/fc/a.grib2",
            raw_field("gh", LevelType::IsobaricInhPa, Some(900.0), 2, 3, 5.0),
        );
        reader.insert(
            "/fc/a.grib2",
            raw_field("gh", LevelType::IsobaricInhPa, Some(500.0), 2, 3, 9.0),
        );
        reader.insert("/fc/a.grib2", raw_field("2t", LevelType::HeightAboveGround, Some(2.0), 2, 3, 280.0));
        Arc::new(reader)
    }

    fn path(p: &str) -> Locator {
        Locator::Path(PathBuf::from(p))
    }

    #[test]
    fn test_extract_matching_field() {
        let extractor = FieldExtractor::new(reader());
        let field = tokio_test::block_on(extractor.extract(&path("/fc/a.grib2"), &selector(Some(500.0))))
            .unwrap();
        assert_eq!(field.header.level, Some(Level(500.0)));
        assert_eq!(field.values[0], 9.0);
    }

    #[test]
    fn test_missing_source_is_unavailable() {
        let extractor = FieldExtractor::new(reader());
        let err = tokio_test::block_on(extractor.extract(&path("/fc/missing.grib2"), &selector(Some(900.0))))
            .unwrap_err();
        assert!(matches!(err, JobFailure::SourceUnavailable(_)));
    }

    #[test]
    fn test_level_mismatch_lists_available_levels() {
        let extractor = FieldExtractor::new(reader());
        let err = tokio_test::block_on(extractor.extract(&path("/fc/a.grib2"), &selector(Some(850.0))))
            .unwrap_err();
        match err {
            JobFailure::LevelMismatch { selector, available } => {
                assert_eq!(selector, "gh@isobaricInhPa 850");
                assert_eq!(available, "500, 900");
            }
            other => panic!("expected LevelMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_level_mismatch_lists_each_level_once() {
        let reader = reader();
        reader.insert(
            "/fc/a.grib2",
            raw_field("gh", LevelType::IsobaricInhPa, Some(900.0), 2, 3, 6.0),
        );
        let extractor = FieldExtractor::new(reader);
        let err = tokio_test::block_on(extractor.extract(&path("/fc/a.grib2"), &selector(Some(700.0))))
            .unwrap_err();
        match err {
            JobFailure::LevelMismatch { available, .. } => assert_eq!(available, "500, 900"),
            other => panic!("expected LevelMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_variable_is_not_found() {
        let extractor = FieldExtractor::new(reader());
        let sel = FieldSelector {
            short_name: "q".to_string(),
            level_type: LevelType::IsobaricInhPa,
            level: Some(Level(900.0)),
        };
        let err = tokio_test::block_on(extractor.extract(&path("/fc/a.grib2"), &sel)).unwrap_err();
        assert!(matches!(err, JobFailure::NotFound(_)));
    }

    #[test]
    fn test_malformed_source() {
        let reader = MemoryReader::new();
        reader.insert_malformed("/fc/bad.grib2");
        let extractor = FieldExtractor::new(Arc::new(reader));
        let err = tokio_test::block_on(extractor.extract(&path("/fc/bad.grib2"), &selector(Some(900.0))))
            .unwrap_err();
        assert!(matches!(err, JobFailure::MalformedSource(_)));
    }

    #[test]
    fn test_inconsistent_field_is_malformed() {
        let reader = MemoryReader::new();
        let mut field = raw_field("gh", LevelType::IsobaricInhPa, Some(900.0), 2, 3, 5.0);
        field.latitude.truncate(2);
        reader.insert("/fc/a.grib2", field);

        let extractor = FieldExtractor::new(Arc::new(reader));
        let err = tokio_test::block_on(extractor.extract(&path("/fc/a.grib2"), &selector(Some(900.0))))
            .unwrap_err();
        assert!(matches!(err, JobFailure::MalformedSource(_)));
    }

    #[test]
    fn test_remote_locator_goes_through_fetcher() {
        let fetcher = StaticFetcher::new().with_url("https://host/a.grib2", "/fc/a.grib2");
        let extractor = FieldExtractor::new(reader()).with_fetcher(Arc::new(fetcher));

        let url = Locator::Url("https://host/a.grib2".to_string());
        let field = tokio_test::block_on(extractor.extract(&url, &selector(Some(900.0)))).unwrap();
        assert_eq!(field.values[0], 5.0);

        let missing = Locator::Url("https://host/b.grib2".to_string());
        let err = tokio_test::block_on(extractor.extract(&missing, &selector(Some(900.0)))).unwrap_err();
        assert!(matches!(err, JobFailure::SourceUnavailable(_)));
    }

    #[test]
    fn test_remote_locator_without_fetcher() {
        let extractor = FieldExtractor::new(reader());
        let url = Locator::Url("https://host/a.grib2".to_string());
        let err = tokio_test::block_on(extractor.extract(&url, &selector(Some(900.0)))).unwrap_err();
        assert!(matches!(err, JobFailure::SourceUnavailable(_)));
    }
}
