//! Common test fixtures for wxvx tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in a verification run.

/// Reference configuration document.
///
/// Cycles 2024-12-19T18 and 2024-12-20T06, lead times 0/6/12 h, four
/// variables (two isobaric, one column, one near-surface).
pub const CONFIG_YAML: &str = r#"baseline:
  name: Baseline
  template: "https://some.url/path/to/a.grib2"
cycles:
  start: "2024-12-19T18:00:00"
  step: "12:00:00"
  stop: "2024-12-20T06:00:00"
forecast:
  name: Forecast
  path: /path/to/forecast
leadtimes:
  start: "00:00:00"
  step: "06:00:00"
  stop: "12:00:00"
plot:
  baseline: true
threads: 4
variables:
  HGT:
    level_type: isobaricInhPa
    levels: [900]
    standard_name: gh
  REFC:
    level_type: atmosphere
    standard_name: refc
  SPFH:
    level_type: isobaricInhPa
    levels: [900]
    standard_name: q
  T2M:
    level_type: heightAboveGround
    levels: [2]
    standard_name: 2t
workdir: /path/to/workdir
"#;

/// Common grid specifications for testing.
pub mod grid {
    /// CONUS-like regular lat/lon grid, coarse enough for unit tests
    pub const CONUS_COARSE: GridSpec = GridSpec {
        width: 8,
        height: 5,
        min_lon: -130.0,
        max_lon: -60.0,
        min_lat: 20.0,
        max_lat: 55.0,
    };

    /// Simple 10x10 test grid
    pub const SIMPLE_10X10: GridSpec = GridSpec {
        width: 10,
        height: 10,
        min_lon: -10.0,
        max_lon: 10.0,
        min_lat: -10.0,
        max_lat: 10.0,
    };

    /// Grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub max_lon: f64,
        pub min_lat: f64,
        pub max_lat: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Returns the resolution in degrees.
        pub fn resolution(&self) -> (f64, f64) {
            let dx = (self.max_lon - self.min_lon) / (self.width.max(2) - 1) as f64;
            let dy = (self.max_lat - self.min_lat) / (self.height.max(2) - 1) as f64;
            (dx, dy)
        }

        /// Same extent with a different point count.
        pub fn with_size(self, width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                ..self
            }
        }
    }
}

/// Common time values for testing.
pub mod time {
    /// First cycle of the reference configuration
    pub const FIRST_CYCLE: &str = "2024-12-19T18:00:00";

    /// Last cycle of the reference configuration
    pub const LAST_CYCLE: &str = "2024-12-20T06:00:00";

    /// Lead times of the reference configuration, in hours
    pub const LEAD_HOURS: [u32; 3] = [0, 6, 12];
}
