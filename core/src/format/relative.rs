use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

const ABSOLUTE_PATTERN: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Human-relative age of `timestamp` as seen at `now`.
///
/// Instants in the future read as "Just now".
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        "Just now".into()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else {
        let hours = minutes / 60;
        format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" })
    }
}

/// Full date and time of `timestamp` in the machine's local zone, for detail
/// views, e.g. "6/1/2025, 9:00:00 AM".
pub fn absolute_time(timestamp: DateTime<Utc>) -> String {
    absolute_time_in(timestamp, &Local)
}

pub fn absolute_time_in<Tz>(timestamp: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp
        .with_timezone(zone)
        .format(ABSOLUTE_PATTERN)
        .to_string()
}
