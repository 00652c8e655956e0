use chrono::{NaiveTime, Timelike};

const FORMATS: &[&str] = &["%I:%M %p", "%I:%M%p", "%H:%M", "%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
}

/// Parses a time of day in 24-hour or 12-hour (`AM`/`PM`, or FullCalendar's
/// abbreviated `8:30a`) notation. Seconds are dropped, events are scheduled
/// to the minute.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();

    let expanded;
    let raw = if raw.ends_with(['a', 'p', 'A', 'P']) {
        expanded = format!("{raw}m");
        expanded.as_str()
    } else {
        raw
    };

    FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .and_then(|time| time.with_second(0))
}

/// Re-renders a time token as 24-hour `HH:MM`.
pub fn normalize_time(raw: &str) -> Option<String> {
    parse_time(raw).map(|time| time.format("%H:%M").to_string())
}

/// Parses `start - end`. The end is optional, the start is not.
pub fn parse_time_range(raw: &str) -> Option<TimeRange> {
    let (start, end) = match raw.split_once(['-', '–']) {
        Some((start, end)) => (start, Some(end)),
        None => (raw, None),
    };

    Some(TimeRange {
        start: parse_time(start)?,
        end: end.and_then(parse_time),
    })
}
