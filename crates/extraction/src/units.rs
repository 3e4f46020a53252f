//! Short-name → CF metadata table.
//!
//! The table is an explicit immutable value handed to the
//! [`Normalizer`](crate::normalize::Normalizer); there is no global lookup.

use std::collections::BTreeMap;

/// CF metadata for one source short name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitsEntry {
    /// CF standard name, e.g. "geopotential_height"
    pub cf_standard_name: String,
    /// UDUNITS string, e.g. "m s-1"
    pub units: String,
    pub long_name: String,
}

impl UnitsEntry {
    pub fn new(cf_standard_name: &str, units: &str, long_name: &str) -> Self {
        Self {
            cf_standard_name: cf_standard_name.to_string(),
            units: units.to_string(),
            long_name: long_name.to_string(),
        }
    }
}

/// Immutable lookup from source short name to [`UnitsEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitsTable {
    entries: BTreeMap<String, UnitsEntry>,
}

impl UnitsTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The entries for the fields the GRIB2 reader knows how to identify.
    pub fn standard() -> Self {
        let entries: [(&str, &str, &str, &str); 13] = [
            ("gh", "geopotential_height", "m", "Geopotential height"),
            ("t", "air_temperature", "K", "Temperature"),
            ("2t", "air_temperature", "K", "2 metre temperature"),
            ("q", "specific_humidity", "1", "Specific humidity"),
            ("r", "relative_humidity", "%", "Relative humidity"),
            ("2r", "relative_humidity", "%", "2 metre relative humidity"),
            ("u", "eastward_wind", "m s-1", "U component of wind"),
            ("10u", "eastward_wind", "m s-1", "10 metre U wind component"),
            ("v", "northward_wind", "m s-1", "V component of wind"),
            ("10v", "northward_wind", "m s-1", "10 metre V wind component"),
            ("refc", "unknown", "dBZ", "Composite reflectivity"),
            ("msl", "air_pressure_at_mean_sea_level", "Pa", "Mean sea level pressure"),
            ("sp", "surface_air_pressure", "Pa", "Surface pressure"),
        ];

        entries
            .into_iter()
            .fold(Self::empty(), |table, (short, cf, units, long)| {
                table.with_entry(short, UnitsEntry::new(cf, units, long))
            })
    }

    /// A copy of this table with `short_name` mapped to `entry`.
    pub fn with_entry(mut self, short_name: &str, entry: UnitsEntry) -> Self {
        self.entries.insert(short_name.to_string(), entry);
        self
    }

    pub fn lookup(&self, short_name: &str) -> Option<&UnitsEntry> {
        self.entries.get(short_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_entries() {
        let table = UnitsTable::standard();
        assert_eq!(table.len(), 13);

        let gh = table.lookup("gh").unwrap();
        assert_eq!(gh.cf_standard_name, "geopotential_height");
        assert_eq!(gh.units, "m");

        assert_eq!(table.lookup("2t").unwrap().units, "K");
        assert_eq!(table.lookup("refc").unwrap().units, "dBZ");
        assert!(table.lookup("tcc").is_none());
    }

    #[test]
    fn test_with_entry_extends_and_replaces() {
        let table = UnitsTable::standard()
            .with_entry("tcc", UnitsEntry::new("cloud_area_fraction", "%", "Total cloud cover"))
            .with_entry("gh", UnitsEntry::new("geopotential_height", "km", "Height"));

        assert_eq!(table.len(), 14);
        assert_eq!(table.lookup("tcc").unwrap().units, "%");
        assert_eq!(table.lookup("gh").unwrap().units, "km");
    }
}
