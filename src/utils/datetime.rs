//! Date filter parsing: `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`, local time.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};

/// Parse a filter timestamp into seconds since the Unix epoch.
///
/// A bare date means midnight local time. Returns `None` on any malformed
/// input; the caller treats that as a fatal configuration error.
pub fn parse_datetime(text: &str) -> Option<i64> {
    let naive: NaiveDateTime = if text.len() > 10 {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok()?
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
    };
    // Ambiguous local times (DST transitions) resolve to the earlier instant.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
}
