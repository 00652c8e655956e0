use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Fields, TimeRange};

/// One scheduled session recovered from a grid.
///
/// Every optional field is an empty string or empty list when unknown; the
/// serialized record always carries all keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm_or_empty", default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Identity of an event across extraction runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub title: String,
}

/// Events decoded from one grid, plus the number of event blocks that had to
/// be skipped (no date column, no parsable start time, or no text at all).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub events: Vec<Event>,
    pub dropped: usize,
}

impl Event {
    #[must_use]
    pub fn assemble(date: NaiveDate, times: TimeRange, fields: Fields) -> Self {
        Self {
            date,
            start_time: times.start,
            end_time: times.end,
            title: fields.title,
            course_code: fields.course_code,
            course_name: fields.course_name,
            location: fields.location,
            teacher: fields.teacher,
            kind: fields.kind,
            groups: fields.groups,
        }
    }

    #[must_use]
    pub fn key(&self) -> EventKey {
        EventKey {
            date: self.date,
            start_time: self.start_time,
            title: self.title.clone(),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:?}",
            self.date,
            self.start_time.format("%H:%M"),
            self.title
        )
    }
}

impl Extraction {
    pub fn append(&mut self, other: &mut Extraction) {
        self.events.append(&mut other.events);
        self.dropped += other.dropped;
        other.dropped = 0;
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::parse_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time of day `{raw}`")))
    }
}

mod hhmm_or_empty {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => super::hhmm::serialize(time, serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }

        crate::parse_time(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid time of day `{raw}`")))
    }
}
