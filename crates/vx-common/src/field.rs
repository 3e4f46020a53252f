//! Contract for the gridded-field reader collaborator.
//!
//! The verification core never looks at file formats. It asks a
//! [`FieldReader`] to list the fields held by a local source and to read the
//! one matching a [`FieldSelector`].

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::level::{Level, LevelType};

/// Shape of a 2-D horizontal grid, row-major (`ny` rows of `nx` points).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct GridShape {
    pub ny: usize,
    pub nx: usize,
}

impl GridShape {
    pub fn new(ny: usize, nx: usize) -> Self {
        Self { ny, nx }
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.ny * self.nx
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What to pick out of a source.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelector {
    /// Source short name (e.g. "gh", "2t")
    pub short_name: String,
    pub level_type: LevelType,
    /// Required level; `None` for single-level variables
    pub level: Option<Level>,
}

/// Identification of one field held by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldHeader {
    pub short_name: String,
    pub level_type: LevelType,
    pub level: Option<Level>,
}

impl FieldHeader {
    /// Same short name and level type, ignoring the level value.
    pub fn same_variable(&self, selector: &FieldSelector) -> bool {
        self.short_name == selector.short_name && self.level_type == selector.level_type
    }

    /// Full match including the level value when the selector has one.
    pub fn matches(&self, selector: &FieldSelector) -> bool {
        self.same_variable(selector)
            && match selector.level {
                Some(level) => self.level == Some(level),
                None => true,
            }
    }
}

/// A field as read from the source, before any metadata is attached.
#[derive(Debug, Clone)]
pub struct RawField {
    pub header: FieldHeader,
    pub shape: GridShape,
    /// Per-point latitudes, row-major, `shape.len()` values
    pub latitude: Vec<f64>,
    /// Per-point longitudes, row-major, `shape.len()` values
    pub longitude: Vec<f64>,
    /// Row-major values, `shape.len()` values
    pub values: Vec<f32>,
    /// Reference time recorded in the source, if it carries one
    pub reference_time: Option<DateTime<Utc>>,
    /// Forecast offset recorded in the source, if it carries one
    pub lead_time: Option<Duration>,
}

impl RawField {
    /// True when coordinate and value arrays agree with the grid shape.
    pub fn is_consistent(&self) -> bool {
        let n = self.shape.len();
        self.latitude.len() == n && self.longitude.len() == n && self.values.len() == n
    }
}

/// Errors raised by a [`FieldReader`].
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The source could not be opened at all.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source opened but its content could not be decoded.
    #[error("malformed source: {0}")]
    Malformed(String),
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        ReadError::Unavailable(err.to_string())
    }
}

/// Open a local source, list its fields, read a field by selector.
///
/// Implementations hold no mutable state shared across calls and may be
/// invoked concurrently.
#[async_trait]
pub trait FieldReader: Send + Sync {
    /// List the fields held by the source at `path`.
    async fn list_fields(&self, path: &Path) -> Result<Vec<FieldHeader>, ReadError>;

    /// Read the first field matching `selector`, or `None` when nothing matches.
    async fn read_field(
        &self,
        path: &Path,
        selector: &FieldSelector,
    ) -> Result<Option<RawField>, ReadError>;
}
