//! Grib2Reader against synthetic files on disk.

mod common;

use std::io::Write;
use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};
use common::{concat, Grib2Builder};
use flate2::write::GzEncoder;
use flate2::Compression;
use grib2_parser::{decompress_gzip, Grib2Reader};
use tempfile::TempDir;
use vx_common::{FieldReader, FieldSelector, Level, LevelType, ReadError};

fn sample_file() -> Vec<u8> {
    concat(&[
        Grib2Builder::new_gfs()
            .with_parameter(3, 5)
            .with_level(100, 90000)
            .with_grid(5, 5)
            .with_constant_value(1000.0)
            .build(),
        Grib2Builder::new_gfs()
            .with_grid(5, 5)
            .with_constant_value(288.15)
            .build(),
        Grib2Builder::new_gfs()
            .with_parameter(16, 196)
            .with_level(10, 0)
            .with_grid(5, 5)
            .with_constant_value(-10.0)
            .build(),
        // Not in the standard tables
        Grib2Builder::new_gfs()
            .with_parameter(19, 0)
            .with_level(1, 0)
            .with_grid(5, 5)
            .build(),
    ])
}

fn write(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_list_fields_identifies_known_parameters() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "sample.grib2", &sample_file());

    let headers = Grib2Reader::standard().list_fields(&path).await.unwrap();

    assert_eq!(headers.len(), 3);

    assert_eq!(headers[0].short_name, "gh");
    assert_eq!(headers[0].level_type, LevelType::IsobaricInhPa);
    assert_eq!(headers[0].level, Some(Level(900.0)));

    assert_eq!(headers[1].short_name, "2t");
    assert_eq!(headers[1].level_type, LevelType::HeightAboveGround);
    assert_eq!(headers[1].level, Some(Level(2.0)));

    assert_eq!(headers[2].short_name, "refc");
    assert_eq!(headers[2].level_type, LevelType::Atmosphere);
    assert_eq!(headers[2].level, None);
}

#[tokio::test]
async fn test_gzip_input_is_transparent() {
    let dir = TempDir::new().unwrap();
    let plain = write(&dir, "sample.grib2", &sample_file());
    let packed = write(&dir, "sample.grib2.gz", &gzip(&sample_file()));

    let reader = Grib2Reader::standard();
    assert_eq!(
        reader.list_fields(&plain).await.unwrap(),
        reader.list_fields(&packed).await.unwrap()
    );
}

#[tokio::test]
async fn test_absent_selector_reads_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "sample.grib2", &sample_file());

    let selector = FieldSelector {
        short_name: "q".to_string(),
        level_type: LevelType::IsobaricInhPa,
        level: Some(Level(900.0)),
    };
    let found = Grib2Reader::standard().read_field(&path, &selector).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_read_field_carries_source_times() {
    let dir = TempDir::new().unwrap();
    let data = concat(&[
        Grib2Builder::new_gfs()
            .with_parameter(3, 5)
            .with_level(100, 90000)
            .with_grid(5, 5)
            .with_reference_time(2024, 12, 19, 12)
            .build(),
        Grib2Builder::new_gfs()
            .with_grid(5, 5)
            .with_reference_time(2024, 12, 19, 18)
            .with_forecast_hour(6)
            .with_constant_value(288.15)
            .build(),
    ]);
    let path = write(&dir, "times.grib2", &data);

    let selector = FieldSelector {
        short_name: "2t".to_string(),
        level_type: LevelType::HeightAboveGround,
        level: Some(Level(2.0)),
    };
    let field = Grib2Reader::standard()
        .read_field(&path, &selector)
        .await
        .unwrap()
        .unwrap();

    let cycle = Utc.with_ymd_and_hms(2024, 12, 19, 18, 0, 0).unwrap();
    assert_eq!(field.reference_time, Some(cycle));
    assert_eq!(field.lead_time, Some(Duration::hours(6)));
    assert_eq!(field.values.len(), 25);
}

#[tokio::test]
async fn test_missing_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = Grib2Reader::standard()
        .list_fields(&dir.path().join("missing.grib2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReadError::Unavailable(_)));
}

#[tokio::test]
async fn test_garbage_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "garbage.grib2", b"this is not a GRIB2 file at all");
    let err = Grib2Reader::standard().list_fields(&path).await.unwrap_err();
    assert!(matches!(err, ReadError::Malformed(_)));
}

#[test]
fn test_decompress_gzip_rejects_plain_bytes() {
    assert!(matches!(
        decompress_gzip(b"GRIB"),
        Err(ReadError::Malformed(_))
    ));
    assert_eq!(&decompress_gzip(&gzip(b"GRIB")).unwrap()[..], b"GRIB");
}
