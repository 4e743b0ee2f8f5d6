//! Timestamp helpers.

use chrono::DateTime;

use crate::Timestamp;

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// Timestamps outside chrono's representable range are rendered as the raw
/// number of seconds.
///
/// # Example
/// ```
/// use divegps::time_utils::format_utc;
/// assert_eq!(format_utc(0), "1970-01-01 00:00:00");
/// ```
pub fn format_utc(when: Timestamp) -> String {
    match DateTime::from_timestamp(when, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{}s", when),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_known_instant() {
        // 2012-12-29 15:30:05 UTC
        assert_eq!(format_utc(1_356_795_005), "2012-12-29 15:30:05");
    }

    #[test]
    fn out_of_range_falls_back_to_seconds() {
        assert_eq!(format_utc(i64::MAX), format!("{}s", i64::MAX));
    }
}
