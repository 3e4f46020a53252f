//! CF-1.8 attribute records and compliance checking.
//!
//! Attributes are fixed records with a required field per entity, so a
//! missing attribute is a construction error rather than a lookup miss.
//! [`check_attributes`] reports every failed check, not just the first.

use serde::Serialize;
use vx_common::LevelType;

use crate::dataset::Dataset;
use crate::normalize::GriddedField;
use crate::units::UnitsEntry;

pub const CONVENTIONS: &str = "CF-1.8";

pub const LATITUDE: &str = "latitude";
pub const LATITUDE_UNITS: &str = "degrees_north";
pub const LONGITUDE: &str = "longitude";
pub const LONGITUDE_UNITS: &str = "degrees_east";
pub const FORECAST_REFERENCE_TIME: &str = "forecast_reference_time";
pub const TIME: &str = "time";
pub const LEAD_TIME: &str = "forecast_period";
pub const LEAD_TIME_UNITS: &str = "seconds";

/// Attributes on the data variable itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableAttrs {
    pub standard_name: String,
    pub units: String,
    pub long_name: String,
}

/// Attributes on a coordinate variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinateAttrs {
    pub standard_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

impl CoordinateAttrs {
    fn new(standard_name: &str, units: Option<&str>) -> Self {
        Self {
            standard_name: standard_name.to_string(),
            units: units.map(str::to_string),
        }
    }
}

/// The complete attribute set of a normalized field or dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CfAttributes {
    #[serde(rename = "Conventions")]
    pub conventions: String,
    pub variable: VariableAttrs,
    pub latitude: CoordinateAttrs,
    pub longitude: CoordinateAttrs,
    pub forecast_reference_time: CoordinateAttrs,
    pub time: CoordinateAttrs,
    pub lead_time: CoordinateAttrs,
    /// Absent for single-level variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CoordinateAttrs>,
}

impl CfAttributes {
    pub fn new(entry: &UnitsEntry, level_type: LevelType) -> Self {
        Self {
            conventions: CONVENTIONS.to_string(),
            variable: VariableAttrs {
                standard_name: entry.cf_standard_name.clone(),
                units: entry.units.clone(),
                long_name: entry.long_name.clone(),
            },
            latitude: CoordinateAttrs::new(LATITUDE, Some(LATITUDE_UNITS)),
            longitude: CoordinateAttrs::new(LONGITUDE, Some(LONGITUDE_UNITS)),
            forecast_reference_time: CoordinateAttrs::new(FORECAST_REFERENCE_TIME, None),
            time: CoordinateAttrs::new(TIME, None),
            lead_time: CoordinateAttrs::new(LEAD_TIME, Some(LEAD_TIME_UNITS)),
            level: level_attrs(level_type),
        }
    }
}

fn level_attrs(level_type: LevelType) -> Option<CoordinateAttrs> {
    match level_type {
        LevelType::IsobaricInhPa => Some(CoordinateAttrs::new("air_pressure", level_type.level_units())),
        LevelType::HeightAboveGround => Some(CoordinateAttrs::new("height", level_type.level_units())),
        LevelType::Atmosphere | LevelType::Surface => None,
    }
}

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CfViolation {
    /// "global", "variable", "latitude", ...
    pub entity: String,
    pub attribute: String,
    pub expected: String,
    /// `None` when the attribute is empty or missing
    pub actual: Option<String>,
}

/// Every failed check for one field or dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceReport {
    pub violations: Vec<CfViolation>,
}

impl ComplianceReport {
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations recorded against `entity`.
    pub fn for_entity<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a CfViolation> + 'a {
        self.violations.iter().filter(move |v| v.entity == entity)
    }

    fn expect_eq(&mut self, entity: &str, attribute: &str, expected: &str, actual: Option<&str>) {
        if actual != Some(expected) {
            self.violations.push(CfViolation {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
                expected: expected.to_string(),
                actual: actual.map(str::to_string),
            });
        }
    }

    fn expect_non_empty(&mut self, entity: &str, attribute: &str, actual: &str) {
        if actual.trim().is_empty() {
            self.violations.push(CfViolation {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
                expected: "non-empty".to_string(),
                actual: None,
            });
        }
    }
}

/// Check an attribute set against the CF-1.8 requirements of the output.
pub fn check_attributes(attrs: &CfAttributes, level_type: LevelType) -> ComplianceReport {
    let mut report = ComplianceReport::default();

    report.expect_eq("global", "Conventions", CONVENTIONS, Some(&attrs.conventions));

    report.expect_non_empty("variable", "standard_name", &attrs.variable.standard_name);
    report.expect_non_empty("variable", "units", &attrs.variable.units);

    for (entity, coord, name, units) in [
        (LATITUDE, &attrs.latitude, LATITUDE, Some(LATITUDE_UNITS)),
        (LONGITUDE, &attrs.longitude, LONGITUDE, Some(LONGITUDE_UNITS)),
        (FORECAST_REFERENCE_TIME, &attrs.forecast_reference_time, FORECAST_REFERENCE_TIME, None),
        (TIME, &attrs.time, TIME, None),
        ("lead_time", &attrs.lead_time, LEAD_TIME, Some(LEAD_TIME_UNITS)),
    ] {
        report.expect_eq(entity, "standard_name", name, Some(&coord.standard_name));
        if let Some(units) = units {
            report.expect_eq(entity, "units", units, coord.units.as_deref());
        }
    }

    match (level_attrs(level_type), &attrs.level) {
        (Some(expected), Some(actual)) => {
            report.expect_eq("level", "standard_name", &expected.standard_name, Some(&actual.standard_name));
            if let Some(units) = expected.units.as_deref() {
                report.expect_eq("level", "units", units, actual.units.as_deref());
            }
        }
        (Some(expected), None) => {
            report.expect_eq("level", "standard_name", &expected.standard_name, None);
        }
        (None, Some(actual)) => report.violations.push(CfViolation {
            entity: "level".to_string(),
            attribute: "standard_name".to_string(),
            expected: "absent for single-level field".to_string(),
            actual: Some(actual.standard_name.clone()),
        }),
        (None, None) => {}
    }

    report
}

/// Check a normalized field: attributes plus coordinate consistency.
pub fn check_field(field: &GriddedField, level_type: LevelType) -> ComplianceReport {
    let mut report = check_attributes(&field.attributes, level_type);

    let n = field.grid.shape.len();
    for (entity, len) in [
        (LATITUDE, field.grid.latitude.len()),
        (LONGITUDE, field.grid.longitude.len()),
        ("variable", field.values.len()),
    ] {
        report.expect_eq(entity, "size", &n.to_string(), Some(&len.to_string()));
    }

    if level_type.is_single_level() != field.level.is_none() {
        report.violations.push(CfViolation {
            entity: "level".to_string(),
            attribute: "value".to_string(),
            expected: if level_type.is_single_level() { "absent" } else { "present" }.to_string(),
            actual: field.level.map(|l| l.to_string()),
        });
    }

    report
}

/// Check an assembled dataset: attributes plus dimension layout.
///
/// Dimensions must be `latitude, longitude, [level,] time, lead_time` in that
/// order, with `shape`, `data`, `present` and the `time` coordinate sized to
/// match.
pub fn check_dataset(dataset: &Dataset, level_type: LevelType) -> ComplianceReport {
    let mut report = check_attributes(&dataset.attributes, level_type);

    let expected_dims = Dataset::dims_for(!level_type.is_single_level()).join(",");
    report.expect_eq("global", "dims", &expected_dims, Some(&dataset.dims.join(",")));

    let mut expected_shape = vec![dataset.grid.shape.ny, dataset.grid.shape.nx];
    if let Some(levels) = &dataset.level {
        expected_shape.push(levels.len());
    }
    expected_shape.push(dataset.forecast_reference_time.len());
    expected_shape.push(dataset.lead_time.len());
    report.expect_eq(
        "global",
        "shape",
        &format!("{:?}", expected_shape),
        Some(&format!("{:?}", dataset.shape)),
    );

    report.expect_eq(
        "variable",
        "size",
        &expected_shape.iter().product::<usize>().to_string(),
        Some(&dataset.data.len().to_string()),
    );
    report.expect_eq(
        "variable",
        "slots",
        &dataset.slot_count().to_string(),
        Some(&dataset.present.len().to_string()),
    );

    let time_shape = format!(
        "[{}, {}]",
        dataset.forecast_reference_time.len(),
        dataset.lead_time.len()
    );
    let rows_match = dataset
        .time
        .iter()
        .all(|row| row.len() == dataset.lead_time.len());
    let actual_time_shape = if rows_match {
        format!("[{}, {}]", dataset.time.len(), dataset.lead_time.len())
    } else {
        "ragged".to_string()
    };
    report.expect_eq(TIME, "shape", &time_shape, Some(&actual_time_shape));

    report
}
