// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format epoch milliseconds as RFC3339, or `None` if out of range.
pub fn format_epoch_millis(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(format_utc_rfc3339)
}

/// Parse an RFC3339 timestamp into epoch milliseconds.
pub fn parse_rfc3339_millis(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|d| d.with_timezone(&Utc).timestamp_millis())
}

/// Render a duration as `H:MM:SS`, or `MM:SS` under an hour.
pub fn format_clock(millis: i64) -> String {
    let total_seconds = millis.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65_000), "01:05");
        assert_eq!(format_clock(3_725_999), "1:02:05");
        assert_eq!(format_clock(-5), "00:00");
    }

    #[test]
    fn test_epoch_round_trip_is_second_precision() {
        let formatted = format_epoch_millis(1_700_000_000_000).unwrap();
        assert_eq!(formatted, "2023-11-14T22:13:20Z");
        assert_eq!(parse_rfc3339_millis(&formatted), Some(1_700_000_000_000));
        assert_eq!(parse_rfc3339_millis("yesterday"), None);
    }
}
