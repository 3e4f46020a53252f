//! [`FieldReader`] implementation over GRIB2 files.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use vx_common::{FieldHeader, FieldReader, FieldSelector, GridShape, RawField, ReadError};

use crate::sections::product_times;
use crate::tables::{Grib2Tables, ParamKey};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reads fields from local GRIB2 files, optionally gzip-compressed.
///
/// Decoding runs on the blocking thread pool. The reader holds no mutable
/// state, so one instance serves every worker.
#[derive(Debug, Clone)]
pub struct Grib2Reader {
    tables: Arc<Grib2Tables>,
}

impl Grib2Reader {
    pub fn new(tables: Arc<Grib2Tables>) -> Self {
        Self { tables }
    }

    /// A reader using [`Grib2Tables::standard`].
    pub fn standard() -> Self {
        Self::new(Arc::new(Grib2Tables::standard()))
    }

    async fn load(path: &Path) -> Result<Bytes, ReadError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ReadError::Unavailable(format!("{}: {}", path.display(), e)))?;

        let gzipped = path.extension().is_some_and(|ext| ext == "gz") || data.starts_with(&GZIP_MAGIC);
        if gzipped {
            decompress_gzip(&data)
        } else {
            Ok(Bytes::from(data))
        }
    }

    async fn scan(&self, path: &Path, selector: Option<FieldSelector>) -> Result<Scan, ReadError> {
        let data = Self::load(path).await?;
        let tables = Arc::clone(&self.tables);

        let scan = tokio::task::spawn_blocking(move || scan(&data, &tables, selector.as_ref()))
            .await
            .map_err(|e| ReadError::Malformed(format!("decoder task failed: {}", e)))??;

        debug!(
            path = %path.display(),
            fields = scan.headers.len(),
            found = scan.field.is_some(),
            "Scanned GRIB2 file"
        );
        Ok(scan)
    }
}

#[async_trait]
impl FieldReader for Grib2Reader {
    async fn list_fields(&self, path: &Path) -> Result<Vec<FieldHeader>, ReadError> {
        Ok(self.scan(path, None).await?.headers)
    }

    async fn read_field(
        &self,
        path: &Path,
        selector: &FieldSelector,
    ) -> Result<Option<RawField>, ReadError> {
        Ok(self.scan(path, Some(selector.clone())).await?.field)
    }
}

/// Decompress gzip-compressed data.
pub fn decompress_gzip(data: &[u8]) -> Result<Bytes, ReadError> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| ReadError::Malformed(format!("gzip: {}", e)))?;
    Ok(Bytes::from(decompressed))
}

#[derive(Debug, Default)]
struct Scan {
    /// Identified fields, in message order
    headers: Vec<FieldHeader>,
    /// The first field matching the selector, decoded
    field: Option<RawField>,
}

fn malformed(err: impl std::fmt::Display) -> ReadError {
    ReadError::Malformed(err.to_string())
}

/// Name a submessage from its codes. Unknown parameters and surfaces are
/// not addressable and yield `None`.
fn identify(
    tables: &Grib2Tables,
    key: ParamKey,
    surface_type: u8,
    surface_value: f64,
) -> Option<FieldHeader> {
    let short_name = tables.short_name(key, surface_type, surface_value)?;
    let level_type = Grib2Tables::level_type(surface_type)?;

    Some(FieldHeader {
        short_name: short_name.to_string(),
        level_type,
        level: Grib2Tables::level(level_type, surface_value),
    })
}

/// Walk every submessage. With a selector, stop at the first match and
/// decode it.
fn scan(data: &[u8], tables: &Grib2Tables, selector: Option<&FieldSelector>) -> Result<Scan, ReadError> {
    let grib = grib::from_reader(Cursor::new(data)).map_err(malformed)?;
    let mut result = Scan::default();

    for (position, (_idx, submsg)) in grib.iter().enumerate() {
        let discipline = submsg.indicator().discipline;
        let prod = submsg.prod_def();

        let (Some(category), Some(number)) = (prod.parameter_category(), prod.parameter_number())
        else {
            continue;
        };
        let Some((first, _)) = prod.fixed_surfaces() else {
            continue;
        };
        let Some(header) = identify(
            tables,
            (discipline, category, number),
            first.surface_type,
            first.value(),
        ) else {
            continue;
        };

        let Some(selector) = selector else {
            result.headers.push(header);
            continue;
        };
        if !header.matches(selector) {
            result.headers.push(header);
            continue;
        }

        let (nx, ny) = submsg.grid_shape().map_err(malformed)?;
        let shape = GridShape::new(ny, nx);

        let (latitude, longitude): (Vec<f64>, Vec<f64>) = submsg
            .latlons()
            .map_err(malformed)?
            .map(|(lat, lon)| (lat as f64, lon as f64))
            .unzip();

        let values: Vec<f32> = grib::Grib2SubmessageDecoder::from(submsg)
            .map_err(malformed)?
            .dispatch()
            .map_err(malformed)?
            .collect();

        let times = product_times(data).get(position).copied().unwrap_or_default();

        let field = RawField {
            header: header.clone(),
            shape,
            latitude,
            longitude,
            values,
            reference_time: times.reference_time,
            lead_time: times.lead_time,
        };

        if !field.is_consistent() {
            return Err(ReadError::Malformed(format!(
                "{} values for a {}x{} grid",
                field.values.len(),
                ny,
                nx
            )));
        }

        result.headers.push(header);
        result.field = Some(field);
        break;
    }

    Ok(result)
}
