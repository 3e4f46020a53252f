//! GRIB2 parameter and level lookup tables.
//!
//! Translates GRIB2 numeric codes into the short names and level types the
//! verification core selects fields by.

use std::collections::HashMap;

use vx_common::{Level, LevelType};

/// Lookup key for parameter: (discipline, category, number)
pub type ParamKey = (u8, u8, u8);

/// Fixed-surface type codes (GRIB2 code table 4.5) this reader understands.
pub mod surface {
    pub const GROUND_OR_WATER: u8 = 1;
    pub const ENTIRE_ATMOSPHERE: u8 = 10;
    pub const ISOBARIC: u8 = 100;
    pub const MEAN_SEA_LEVEL: u8 = 101;
    pub const HEIGHT_ABOVE_GROUND: u8 = 103;
    pub const ENTIRE_ATMOSPHERE_AS_LAYER: u8 = 200;
}

/// GRIB2 parameter and level lookup tables.
#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    /// (discipline, category, number) -> short name (e.g., "t", "gh")
    parameters: HashMap<ParamKey, String>,
    /// Names that apply at one fixed height above ground (e.g., "2t")
    height_names: HashMap<(ParamKey, u32), String>,
}

impl Grib2Tables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables for the fields the verification units table knows.
    pub fn standard() -> Self {
        let mut tables = Self::new();

        tables.add_parameter(0, 0, 0, "t");
        tables.add_parameter(0, 1, 0, "q");
        tables.add_parameter(0, 1, 1, "r");
        tables.add_parameter(0, 2, 2, "u");
        tables.add_parameter(0, 2, 3, "v");
        tables.add_parameter(0, 3, 0, "sp");
        tables.add_parameter(0, 3, 1, "msl");
        tables.add_parameter(0, 3, 5, "gh");
        tables.add_parameter(0, 16, 196, "refc");

        tables.add_height_name(0, 0, 0, 2, "2t");
        tables.add_height_name(0, 1, 1, 2, "2r");
        tables.add_height_name(0, 2, 2, 10, "10u");
        tables.add_height_name(0, 2, 3, 10, "10v");

        tables
    }

    /// Add a parameter mapping
    pub fn add_parameter(&mut self, discipline: u8, category: u8, number: u8, name: &str) {
        self.parameters
            .insert((discipline, category, number), name.to_string());
    }

    /// Add a name used only at `height` meters above ground
    pub fn add_height_name(
        &mut self,
        discipline: u8,
        category: u8,
        number: u8,
        height: u32,
        name: &str,
    ) {
        self.height_names
            .insert(((discipline, category, number), height), name.to_string());
    }

    /// Look up the short name for a parameter on a surface.
    ///
    /// Height-specific names win over the generic name.
    pub fn short_name(
        &self,
        key: ParamKey,
        surface_type: u8,
        surface_value: f64,
    ) -> Option<&str> {
        if surface_type == surface::HEIGHT_ABOVE_GROUND && surface_value.fract() == 0.0 {
            if let Some(name) = self.height_names.get(&(key, surface_value as u32)) {
                return Some(name);
            }
        }
        self.parameters.get(&key).map(String::as_str)
    }

    /// Level type for a fixed-surface code.
    pub fn level_type(surface_type: u8) -> Option<LevelType> {
        match surface_type {
            surface::ISOBARIC => Some(LevelType::IsobaricInhPa),
            surface::HEIGHT_ABOVE_GROUND => Some(LevelType::HeightAboveGround),
            surface::ENTIRE_ATMOSPHERE | surface::ENTIRE_ATMOSPHERE_AS_LAYER => {
                Some(LevelType::Atmosphere)
            }
            surface::GROUND_OR_WATER | surface::MEAN_SEA_LEVEL => Some(LevelType::Surface),
            _ => None,
        }
    }

    /// Level in the units of its level type: Pa → hPa for isobaric surfaces.
    pub fn level(level_type: LevelType, surface_value: f64) -> Option<Level> {
        match level_type {
            LevelType::IsobaricInhPa => Some(Level(surface_value / 100.0)),
            LevelType::HeightAboveGround => Some(Level(surface_value)),
            LevelType::Atmosphere | LevelType::Surface => None,
        }
    }

    /// Get the number of parameters in the table
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Check if the tables are empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.height_names.is_empty()
    }
}
