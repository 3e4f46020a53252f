//! GRIB2 field reader (WMO FM 92 GRIB Edition 2).
//!
//! Implements the verification core's [`vx_common::FieldReader`] contract on
//! top of the `grib` crate. Parameters and fixed surfaces are mapped to short
//! names and level types through [`Grib2Tables`].

pub mod reader;
pub mod sections;
pub mod tables;

pub use reader::{decompress_gzip, Grib2Reader};
pub use sections::{product_times, ProductTimes};
pub use tables::{Grib2Tables, ParamKey};
