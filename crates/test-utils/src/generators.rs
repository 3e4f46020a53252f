//! Test data generators for creating synthetic weather-like data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use chrono::{DateTime, Duration, Utc};
use vx_common::{FieldHeader, GridShape, Level, LevelType, RawField};

use crate::fixtures::grid::{GridSpec, CONUS_COARSE};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// The values range from approximately 250K (-23C) to 310K (37C),
/// creating a gradient pattern similar to real weather data.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            // Create a gradient from cold (top-left) to warm (bottom-right)
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            // Temperature range: 250K to 310K
            let temp = 250.0 + (x_factor * 30.0) + (y_factor * 30.0);
            data.push(temp);
        }
    }
    data
}

/// Per-point latitudes and longitudes of a regular grid, row-major.
///
/// Rows run north to south, columns west to east.
pub fn create_latlon_grid(spec: &GridSpec) -> (Vec<f64>, Vec<f64>) {
    let (dx, dy) = spec.resolution();
    let mut lat = Vec::with_capacity(spec.size());
    let mut lon = Vec::with_capacity(spec.size());
    for row in 0..spec.height {
        for col in 0..spec.width {
            lat.push(spec.max_lat - row as f64 * dy);
            lon.push(spec.min_lon + col as f64 * dx);
        }
    }
    (lat, lon)
}

/// A raw field on a regular `ny` × `nx` grid.
///
/// Values are `base + create_test_grid(nx, ny)`, so the first point equals
/// `base`. No reference or lead time is recorded.
pub fn raw_field(
    short_name: &str,
    level_type: LevelType,
    level: Option<f64>,
    ny: usize,
    nx: usize,
    base: f32,
) -> RawField {
    let spec = CONUS_COARSE.with_size(nx, ny);
    let (latitude, longitude) = create_latlon_grid(&spec);

    RawField {
        header: FieldHeader {
            short_name: short_name.to_string(),
            level_type,
            level: level.map(Level),
        },
        shape: GridShape::new(ny, nx),
        latitude,
        longitude,
        values: create_test_grid(nx, ny)
            .into_iter()
            .map(|v| base + v)
            .collect(),
        reference_time: None,
        lead_time: None,
    }
}

/// A raw field that records its own reference and lead time.
pub fn raw_field_at(
    short_name: &str,
    level_type: LevelType,
    level: Option<f64>,
    cycle: DateTime<Utc>,
    leadtime: Duration,
) -> RawField {
    let mut field = raw_field(short_name, level_type, level, 3, 4, 0.0);
    field.values = create_temperature_grid(4, 3);
    field.reference_time = Some(cycle);
    field.lead_time = Some(leadtime);
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(3, 2);
        assert_eq!(grid, vec![0.0, 1000.0, 2000.0, 1.0, 1001.0, 2001.0]);
    }

    #[test]
    fn test_create_temperature_grid() {
        let grid = create_temperature_grid(10, 10);
        assert_eq!(grid.len(), 100);
        assert!(grid.iter().all(|&t| (250.0..=310.0).contains(&t)));
        assert_eq!(grid[0], 250.0);
    }

    #[test]
    fn test_create_latlon_grid() {
        let spec = CONUS_COARSE.with_size(3, 2);
        let (lat, lon) = create_latlon_grid(&spec);
        assert_eq!(lat, vec![55.0, 55.0, 55.0, 20.0, 20.0, 20.0]);
        assert_eq!(lon, vec![-130.0, -95.0, -60.0, -130.0, -95.0, -60.0]);
    }

    #[test]
    fn test_raw_field_is_consistent() {
        let field = raw_field("gh", LevelType::IsobaricInhPa, Some(900.0), 2, 3, 7.0);
        assert!(field.is_consistent());
        assert_eq!(field.values[0], 7.0);
        assert_eq!(field.header.level, Some(Level(900.0)));
    }
}
