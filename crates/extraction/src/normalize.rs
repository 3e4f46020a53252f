//! Metadata normalization: raw field → CF-1.8 gridded field.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use vx_common::{GridShape, Level, RawField, TimeCoords};

use crate::cf::CfAttributes;
use crate::error::JobFailure;
use crate::units::UnitsTable;
use crate::variable::VariableSpec;

/// Horizontal grid: shape plus per-point coordinates, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub shape: GridShape,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
}

/// A normalized field for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    /// Variable name, e.g. "HGT"
    pub name: String,
    pub attributes: CfAttributes,
    pub grid: Grid,
    /// Source of the forecast_reference_time, time and lead_time coordinates
    pub time: TimeCoords,
    /// `None` for single-level variables
    pub level: Option<Level>,
    pub values: Vec<f32>,
}

impl GriddedField {
    pub fn forecast_reference_time(&self) -> chrono::DateTime<chrono::Utc> {
        self.time.cycle
    }

    pub fn validtime(&self) -> chrono::DateTime<chrono::Utc> {
        self.time.validtime()
    }

    pub fn lead_time(&self) -> chrono::Duration {
        self.time.leadtime
    }
}

/// Attaches CF metadata to raw fields.
#[derive(Debug, Clone)]
pub struct Normalizer {
    units: Arc<UnitsTable>,
}

impl Normalizer {
    pub fn new(units: Arc<UnitsTable>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &UnitsTable {
        &self.units
    }

    /// Wrap `raw` as the field for (`variable`, `time`, `level`).
    ///
    /// Coordinates come from the job, not the source: the source's own
    /// reference and lead times are only compared and warned about.
    pub fn normalize(
        &self,
        raw: RawField,
        variable: &VariableSpec,
        time: TimeCoords,
        level: Option<Level>,
    ) -> Result<GriddedField, JobFailure> {
        let entry = self
            .units
            .lookup(&variable.standard_name)
            .ok_or_else(|| JobFailure::UnknownUnits(variable.standard_name.clone()))?;

        if !raw.is_consistent() {
            return Err(JobFailure::MalformedSource(format!(
                "{} values for a {}x{} grid",
                raw.values.len(),
                raw.shape.ny,
                raw.shape.nx
            )));
        }

        if let Some(reference) = raw.reference_time {
            if reference != time.cycle {
                warn!(
                    variable = %variable.name,
                    expected = %time.cycle,
                    found = %reference,
                    "Source reference time differs from cycle"
                );
            }
        }
        if let Some(lead) = raw.lead_time {
            if lead != time.leadtime {
                warn!(
                    variable = %variable.name,
                    expected = time.leadtime.num_seconds(),
                    found = lead.num_seconds(),
                    "Source lead time differs from job lead time"
                );
            }
        }

        let level = if variable.is_single_level() { None } else { level };

        Ok(GriddedField {
            name: variable.name.clone(),
            attributes: CfAttributes::new(entry, variable.level_type),
            grid: Grid {
                shape: raw.shape,
                latitude: raw.latitude,
                longitude: raw.longitude,
            },
            time,
            level,
            values: raw.values,
        })
    }
}
