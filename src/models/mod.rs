//! Data shapes for the PocketBase records this gateway reads and writes.
//!
//! The schemas live in PocketBase, not here; these structs mirror the fields
//! the handlers actually touch and serialize naturally as JSON via `serde`.

pub mod contact;
pub mod session;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a PocketBase timestamp string.
///
/// PocketBase emits `2024-01-02 15:04:05.000Z`; RFC 3339 is accepted as a
/// fallback for instances configured differently.
pub fn parse_pb_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.fZ") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a timestamp the way PocketBase stores them.
pub fn format_pb_timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_pocketbase_native_timestamps() {
        let parsed = parse_pb_timestamp("2024-03-05 14:30:00.123Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 123);
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T14:30:00.123+00:00");
    }

    #[test]
    fn falls_back_to_rfc3339() {
        let parsed = parse_pb_timestamp("2024-03-05T14:30:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap());
    }

    #[test]
    fn round_trips_through_the_storage_format() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let formatted = format_pb_timestamp(ts);
        assert_eq!(formatted, "2025-01-01 00:00:00.000Z");
        assert_eq!(parse_pb_timestamp(&formatted).unwrap(), ts);
    }
}
