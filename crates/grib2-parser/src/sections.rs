//! Time metadata read directly from GRIB2 section bytes.
//!
//! Section 1 carries the reference time of a message and Section 4 the
//! forecast offset of each product. [`product_times`] walks every message
//! in a file and yields one entry per Section 4, in file order, which is
//! also the order the `grib` crate enumerates submessages in.

use chrono::{DateTime, Duration, NaiveDate, Utc};

const INDICATOR_LEN: usize = 16;
const END_MARKER: &[u8; 4] = b"7777";

/// Times recorded for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductTimes {
    pub reference_time: Option<DateTime<Utc>>,
    pub lead_time: Option<Duration>,
}

/// Times for every product in `data`, in file order. Stops at the first
/// structurally invalid message.
pub fn product_times(data: &[u8]) -> Vec<ProductTimes> {
    let mut times = Vec::new();
    let mut offset = 0;

    while let Some(start) = find_magic(data, offset) {
        let Some(message_len) = data
            .get(start + 8..start + INDICATOR_LEN)
            .map(|b| u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as usize)
        else {
            break;
        };
        let Some(message) = start
            .checked_add(message_len)
            .and_then(|end| data.get(start..end))
        else {
            break;
        };

        let mut reference_time = None;
        let mut pos = INDICATOR_LEN;
        while pos + 5 <= message.len() && &message[pos..pos + 4] != END_MARKER {
            let section_len = u32::from_be_bytes([
                message[pos],
                message[pos + 1],
                message[pos + 2],
                message[pos + 3],
            ]) as usize;
            if section_len < 5 || pos + section_len > message.len() {
                return times;
            }

            let section = &message[pos..pos + section_len];
            match section[4] {
                1 => reference_time = parse_reference_time(section),
                4 => times.push(ProductTimes {
                    reference_time,
                    lead_time: parse_forecast_time(section),
                }),
                _ => {}
            }
            pos += section_len;
        }

        offset = start + message_len.max(INDICATOR_LEN);
    }

    times
}

fn find_magic(data: &[u8], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(4)
        .position(|w| w == b"GRIB")
        .map(|p| from + p)
}

/// Reference time from Section 1 (octets 13-19).
fn parse_reference_time(section: &[u8]) -> Option<DateTime<Utc>> {
    let b = section.get(12..19)?;
    let year = u16::from_be_bytes([b[0], b[1]]) as i32;

    let naive = NaiveDate::from_ymd_opt(year, b[2] as u32, b[3] as u32)?
        .and_hms_opt(b[4] as u32, b[5] as u32, b[6] as u32)?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// Forecast time from Section 4. Templates 4.0 to 4.15 share the layout:
/// unit at octet 18, value at octets 19-22.
fn parse_forecast_time(section: &[u8]) -> Option<Duration> {
    let template = u16::from_be_bytes([*section.get(7)?, *section.get(8)?]);
    if template > 15 {
        return None;
    }

    let unit = *section.get(17)?;
    let b = section.get(18..22)?;
    let value = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as i64;

    // Code table 4.4
    let seconds = match unit {
        0 => 60,
        1 => 3_600,
        2 => 86_400,
        10 => 3 * 3_600,
        11 => 6 * 3_600,
        12 => 12 * 3_600,
        13 => 1,
        _ => return None,
    };
    Some(Duration::seconds(value * seconds))
}
