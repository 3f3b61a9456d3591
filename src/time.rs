//! Conversion between wire timestamps and time values.
//!
//! Wire timestamps are microseconds since the Unix epoch, stored as unsigned
//! 64-bit little-endian integers.

use chrono::{DateTime, SecondsFormat, Utc};

/// Convert a wire timestamp to a time value.
///
/// Total over all inputs: the microseconds are scaled to nanoseconds with
/// wrapping arithmetic and read back as a signed nanosecond offset.
pub fn time_from_micros(micros: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(micros.wrapping_mul(1_000) as i64)
}

/// Convert a time value to a wire timestamp.
pub fn micros_from_time(time: &DateTime<Utc>) -> u64 {
    time.timestamp_micros() as u64
}

pub fn millis_from_time(time: &DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub fn seconds_from_time(time: &DateTime<Utc>) -> i64 {
    time.timestamp()
}

/// RFC 3339 text with nanosecond precision and trailing fractional zeros
/// removed, e.g. `1970-01-01T00:00:01.5Z`.
pub fn format_rfc3339_nanos(time: &DateTime<Utc>) -> String {
    let text = time.to_rfc3339_opts(SecondsFormat::Nanos, true);
    match text.strip_suffix('Z') {
        Some(stamp) if stamp.contains('.') => {
            format!("{}Z", stamp.trim_end_matches('0').trim_end_matches('.'))
        }
        _ => text,
    }
}

/// Current time as a wire timestamp.
pub fn now_micros() -> u64 {
    micros_from_time(&Utc::now())
}
