//! Per-variable dataset assembly.
//!
//! Fields for one (source, variable) are merged into a single dense array
//! over `latitude, longitude, level, time, lead_time`. Points of a slot whose
//! job failed stay `None`: missing, never zero.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use vx_common::time::durations_seconds;
use vx_common::{Level, TimeCoords};

use crate::cf::CfAttributes;
use crate::error::VariableFailure;
use crate::normalize::{Grid, GriddedField};
use crate::source::{SourceDescriptor, SourceRole};
use crate::variable::VariableSpec;

const DIMS_MULTI_LEVEL: [&str; 5] = ["latitude", "longitude", "level", "time", "lead_time"];
const DIMS_SINGLE_LEVEL: [&str; 4] = ["latitude", "longitude", "time", "lead_time"];

/// A merged, CF-annotated dataset for one variable from one source.
///
/// `data` is dense and row-major over `dims`, with `shape` giving the size of
/// each dimension. The `time` dimension runs over cycles and carries
/// `forecast_reference_time`; the `time` coordinate holds valid times with
/// shape `[time, lead_time]`. A `None` value is a missing point: either
/// masked in the source grid or in a slot whose job failed. `present` tells
/// the two apart, one flag per `[level, time, lead_time]` slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub name: String,
    pub source: String,
    pub role: SourceRole,
    pub attributes: CfAttributes,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub grid: Grid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Vec<Level>>,
    pub forecast_reference_time: Vec<DateTime<Utc>>,
    #[serde(with = "durations_seconds")]
    pub lead_time: Vec<Duration>,
    pub time: Vec<Vec<DateTime<Utc>>>,
    pub present: Vec<bool>,
    pub data: Vec<Option<f32>>,
}

impl Dataset {
    /// Dimension names, outermost first.
    pub fn dims_for(multi_level: bool) -> Vec<String> {
        let dims: &[&str] = if multi_level {
            &DIMS_MULTI_LEVEL
        } else {
            &DIMS_SINGLE_LEVEL
        };
        dims.iter().map(|d| d.to_string()).collect()
    }

    /// Merge `fields` (in canonical job order) into one dataset.
    ///
    /// The first field fixes the grid. Returns `Ok(None)` when there is
    /// nothing to merge.
    pub fn assemble(
        source: &SourceDescriptor,
        variable: &VariableSpec,
        cycles: &[DateTime<Utc>],
        leadtimes: &[Duration],
        fields: Vec<GriddedField>,
    ) -> Result<Option<Self>, VariableFailure> {
        let mut fields = fields.into_iter();
        let Some(first) = fields.next() else {
            return Ok(None);
        };

        let levels = if variable.is_single_level() {
            None
        } else {
            Some(variable.levels.clone())
        };

        let grid_shape = first.grid.shape;
        let mut shape = vec![grid_shape.ny, grid_shape.nx];
        if let Some(levels) = &levels {
            shape.push(levels.len());
        }
        shape.push(cycles.len());
        shape.push(leadtimes.len());

        let mut dataset = Self {
            name: variable.name.clone(),
            source: source.name.clone(),
            role: source.role,
            attributes: first.attributes.clone(),
            dims: Self::dims_for(levels.is_some()),
            shape,
            grid: first.grid.clone(),
            level: levels,
            forecast_reference_time: cycles.to_vec(),
            lead_time: leadtimes.to_vec(),
            time: cycles
                .iter()
                .map(|c| leadtimes.iter().map(|l| *c + *l).collect())
                .collect(),
            present: Vec::new(),
            data: Vec::new(),
        };
        dataset.present = vec![false; dataset.slot_count()];
        dataset.data = vec![None; grid_shape.len() * dataset.slot_count()];

        dataset.place(first);
        for field in fields {
            if field.grid.shape != dataset.grid.shape {
                return Err(VariableFailure::ShapeMismatch {
                    expected: dataset.grid.shape,
                    found: field.grid.shape,
                    at: field.time,
                });
            }
            dataset.place(field);
        }

        Ok(Some(dataset))
    }

    fn place(&mut self, field: GriddedField) {
        let Some(slot) = self.slot_index(&field.time, field.level) else {
            return;
        };
        let slots = self.slot_count();
        for (point, value) in field.values.into_iter().enumerate() {
            if let Some(cell) = self.data.get_mut(point * slots + slot) {
                *cell = value.is_finite().then_some(value);
            }
        }
        self.present[slot] = true;
    }

    fn level_count(&self) -> usize {
        self.level.as_ref().map_or(1, Vec::len)
    }

    /// Number of grid points per slot.
    pub fn point_count(&self) -> usize {
        self.grid.shape.len()
    }

    /// Expected number of slots: levels × cycles × lead times.
    pub fn slot_count(&self) -> usize {
        self.level_count() * self.forecast_reference_time.len() * self.lead_time.len()
    }

    /// Position of a slot in `present`: row-major over `[level, time, lead_time]`.
    fn slot_index(&self, time: &TimeCoords, level: Option<Level>) -> Option<usize> {
        let c = self.forecast_reference_time.iter().position(|t| *t == time.cycle)?;
        let l = self.lead_time.iter().position(|d| *d == time.leadtime)?;
        let z = match (&self.level, level) {
            (Some(levels), Some(level)) => levels.iter().position(|v| *v == level)?,
            (None, None) => 0,
            _ => return None,
        };
        Some((z * self.forecast_reference_time.len() + c) * self.lead_time.len() + l)
    }

    /// The grid at one slot, if that job succeeded.
    pub fn get(&self, time: &TimeCoords, level: Option<Level>) -> Option<Vec<Option<f32>>> {
        let slot = self.slot_index(time, level)?;
        if !self.present.get(slot).copied().unwrap_or(false) {
            return None;
        }
        let slots = self.slot_count();
        Some(
            (0..self.point_count())
                .map(|point| self.data.get(point * slots + slot).copied().flatten())
                .collect(),
        )
    }

    /// Number of populated slots.
    pub fn valid_slots(&self) -> usize {
        self.present.iter().filter(|p| **p).count()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_slots() == 0
    }

    /// Canonical byte form. Identical inputs give identical bytes.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
