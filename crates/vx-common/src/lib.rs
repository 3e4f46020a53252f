//! Common types shared across the wxvx workspace.
//!
//! Holds the value types every component indexes by ([`TimeCoords`],
//! [`Level`]) and the narrow contracts of the external collaborators: the
//! gridded-field reader and the remote fetcher.

pub mod fetch;
pub mod field;
pub mod level;
pub mod time;

pub use fetch::{FetchError, Fetcher};
pub use field::{FieldHeader, FieldReader, FieldSelector, GridShape, RawField, ReadError};
pub use level::{Level, LevelType};
pub use time::{format_duration, parse_duration, parse_timestamp, TimeCoords, TimeParseError};
