//! Vertical level types.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of vertical coordinate a variable is defined on.
///
/// Names follow the GRIB `typeOfLevel` key used in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelType {
    /// Pressure levels in hPa
    #[serde(rename = "isobaricInhPa")]
    IsobaricInhPa,
    /// Height above ground in meters
    #[serde(rename = "heightAboveGround")]
    HeightAboveGround,
    /// Entire atmosphere considered as a single layer
    #[serde(rename = "atmosphere")]
    Atmosphere,
    /// Ground or water surface
    #[serde(rename = "surface")]
    Surface,
}

impl LevelType {
    /// True when the variable has no vertical dimension.
    pub fn is_single_level(&self) -> bool {
        matches!(self, LevelType::Atmosphere | LevelType::Surface)
    }

    /// The configuration spelling of this level type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelType::IsobaricInhPa => "isobaricInhPa",
            LevelType::HeightAboveGround => "heightAboveGround",
            LevelType::Atmosphere => "atmosphere",
            LevelType::Surface => "surface",
        }
    }

    /// Units of the numeric level values, for multi-level types.
    pub fn level_units(&self) -> Option<&'static str> {
        match self {
            LevelType::IsobaricInhPa => Some("hPa"),
            LevelType::HeightAboveGround => Some("m"),
            LevelType::Atmosphere | LevelType::Surface => None,
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric vertical level (hPa or meters depending on the level type).
///
/// Totally ordered so levels can be sorted and used as map keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(pub f64);

impl Level {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Level {}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for Level {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<u32> for Level {
    fn from(v: u32) -> Self {
        Level(v as f64)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
