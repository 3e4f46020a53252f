//! Time handling for forecast verification.
//!
//! Every field in a verification run is indexed by a [`TimeCoords`]: the
//! forecast cycle (initialization time) and the lead time from that cycle.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One (cycle, lead time) pair.
///
/// Ordering is lexicographic on `(cycle, leadtime)`, which is the order the
/// schedule expander emits and the order datasets are assembled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeCoords {
    /// Forecast initialization time.
    pub cycle: DateTime<Utc>,
    /// Offset from the cycle to the valid time.
    #[serde(with = "duration_seconds")]
    pub leadtime: Duration,
}

impl TimeCoords {
    /// Create time coordinates, rejecting negative lead times.
    pub fn new(cycle: DateTime<Utc>, leadtime: Duration) -> Result<Self, TimeParseError> {
        if leadtime < Duration::zero() {
            return Err(TimeParseError::NegativeLeadTime(format_duration(&leadtime)));
        }
        Ok(Self { cycle, leadtime })
    }

    /// Create time coordinates with a lead time in whole hours.
    pub fn from_hours(cycle: DateTime<Utc>, hours: u32) -> Self {
        Self {
            cycle,
            leadtime: Duration::hours(hours as i64),
        }
    }

    /// The real-world time the field represents.
    pub fn validtime(&self) -> DateTime<Utc> {
        self.cycle + self.leadtime
    }

    /// Lead time in whole hours (truncated).
    pub fn lead_hours(&self) -> i64 {
        self.leadtime.num_hours()
    }
}

impl fmt::Display for TimeCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.cycle.format("%Y-%m-%dT%H:%M:%S"),
            format_duration(&self.leadtime)
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Lead time must not be negative: {0}")]
    NegativeLeadTime(String),
}

/// Parse an absolute timestamp; a missing offset means UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` and a bare
/// `YYYY-MM-DD` date.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidTimestamp(s.to_string()))
}

/// Parse a non-negative duration.
///
/// Accepts `HH:MM:SS` (hours may exceed 24), `HH:MM`, or a bare integer
/// number of hours.
pub fn parse_duration(s: &str) -> Result<Duration, TimeParseError> {
    let s = s.trim();
    let invalid = || TimeParseError::InvalidDuration(s.to_string());

    let parts: Vec<&str> = s.split(':').collect();
    let numbers = parts
        .iter()
        .map(|p| {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                p.parse::<i64>().ok()
            }
        })
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(invalid)?;

    let (hours, minutes, seconds) = match numbers.as_slice() {
        [h] => (*h, 0, 0),
        [h, m] => (*h, *m, 0),
        [h, m, sec] => (*h, *m, *sec),
        _ => return Err(invalid()),
    };

    if parts.len() > 1 && (minutes >= 60 || seconds >= 60) {
        return Err(invalid());
    }

    Ok(Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds))
}

/// Format a duration as `HH:MM:SS`, with hours unbounded.
pub fn format_duration(d: &Duration) -> String {
    let total = d.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Serde adapter storing a [`Duration`] as whole seconds.
pub mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(seconds))
    }
}

/// Serde adapter storing a list of [`Duration`]s as whole seconds.
pub mod durations_seconds {
    use chrono::Duration;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ds: &[Duration], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(ds.len()))?;
        for d in ds {
            seq.serialize_element(&d.num_seconds())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Duration>, D::Error> {
        let seconds = Vec::<i64>::deserialize(deserializer)?;
        Ok(seconds.into_iter().map(Duration::seconds).collect())
    }
}
