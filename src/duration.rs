//! Compact human-readable durations ("1d 4h 22m 30s")

use chrono::{DateTime, Utc};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Format a signed second delta as days/hours/minutes/seconds
///
/// The sign is ignored. Units with a zero value are omitted, except seconds,
/// which are always present, so `0` formats as `"0s"`.
///
/// ```
/// use forum_composer::duration::format_duration;
///
/// assert_eq!(format_duration(90061), "1d 1h 1m 1s");
/// assert_eq!(format_duration(3600), "1h 0s");
/// assert_eq!(format_duration(-5), "5s");
/// ```
pub fn format_duration(delta_seconds: i64) -> String {
    let mut remaining = delta_seconds.unsigned_abs();
    let mut parts = Vec::with_capacity(4);

    for (unit, suffix) in [
        (SECS_PER_DAY, 'd'),
        (SECS_PER_HOUR, 'h'),
        (SECS_PER_MINUTE, 'm'),
    ] {
        let value = remaining / unit;
        if value > 0 {
            parts.push(format!("{}{}", value, suffix));
            remaining %= unit;
        }
    }
    parts.push(format!("{}s", remaining));

    parts.join(" ")
}

/// Format the time elapsed between two instants
pub fn format_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_duration((now - then).num_seconds())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_all_units() {
        assert_eq!(format_duration(90061), "1d 1h 1m 1s");
    }

    #[test]
    fn test_seconds_only() {
        assert_eq!(format_duration(5), "5s");
    }

    #[test]
    fn test_zero_emits_seconds() {
        assert_eq!(format_duration(0), "0s");
    }

    #[test]
    fn test_zero_units_are_skipped_except_seconds() {
        assert_eq!(format_duration(86400), "1d 0s");
        assert_eq!(format_duration(86400 + 120), "1d 2m 0s");
        assert_eq!(format_duration(7322), "2h 2m 2s");
    }

    #[test]
    fn test_negative_delta_uses_absolute_value() {
        assert_eq!(format_duration(-90061), "1d 1h 1m 1s");
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let formatted = format_duration(i64::MIN);
        assert!(formatted.ends_with('s'));
        assert!(formatted.contains('d'));
    }

    #[test]
    fn test_format_since_is_order_independent() {
        let then = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 13, 1, 1).unwrap();
        assert_eq!(format_since(then, now), "1d 1h 1m 1s");
        assert_eq!(format_since(now, then), "1d 1h 1m 1s");
    }
}
