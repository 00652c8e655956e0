use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tempfile::NamedTempFile;

use crate::{Event, EventKey, Result};

/// The persisted set of events, unique by composite key.
///
/// Keys order by date, then start time, then title, so iteration and the
/// saved file are always sorted chronologically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCollection {
    events: BTreeMap<EventKey, Event>,
}

impl EventCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store written by [`EventCollection::save`].
    ///
    /// A missing file is an empty collection. So is a file that does not
    /// parse, after logging a warning, which makes the next reconciliation a
    /// full re-baseline.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No event store at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(collection) => Ok(collection),
            Err(err) => {
                warn!(
                    "Event store {} is corrupt ({err}), starting from an empty collection",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    /// Writes the collection as a sorted JSON array, replacing `path`
    /// atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        file.persist(path)?;

        Ok(())
    }

    pub fn get(&self, key: &EventKey) -> Option<&Event> {
        self.events.get(key)
    }

    /// Inserts or replaces the event with the same key.
    pub fn insert(&mut self, event: Event) -> Option<Event> {
        self.events.insert(event.key(), event)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }
}

impl FromIterator<Event> for EventCollection {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut collection = Self::default();
        for event in iter {
            collection.insert(event);
        }
        collection
    }
}

impl IntoIterator for EventCollection {
    type Item = Event;
    type IntoIter = std::collections::btree_map::IntoValues<EventKey, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_values()
    }
}

impl Serialize for EventCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.events.values())
    }
}

impl<'de> Deserialize<'de> for EventCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Event>::deserialize(deserializer).map(Self::from_iter)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn event(day: u32, hour: u32, title: &str) -> Event {
        Event {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0),
            title: title.into(),
            course_code: "062".into(),
            course_name: "Physiology".into(),
            location: "Amphi G5".into(),
            teacher: "Doe Jane".into(),
            kind: "CM".into(),
            groups: vec!["VET3".into()],
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let collection = EventCollection::from_iter([
            event(27, 8, "B"),
            event(26, 14, "A"),
            event(26, 8, "C"),
        ]);
        collection.save(&path).unwrap();

        assert_eq!(EventCollection::load(&path).unwrap(), collection);
    }

    #[test]
    fn saved_file_is_sorted_by_date_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        EventCollection::from_iter([event(27, 8, "B"), event(26, 14, "A"), event(26, 8, "C")])
            .save(&path)
            .unwrap();

        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let order = raw
            .iter()
            .map(|event| (event["date"].as_str().unwrap(), event["start_time"].as_str().unwrap()))
            .collect::<Vec<_>>();

        assert_eq!(
            order,
            [
                ("2026-01-26", "08:00"),
                ("2026-01-26", "14:00"),
                ("2026-01-27", "08:00")
            ]
        );
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let collection = EventCollection::load(dir.path().join("absent.json")).unwrap();

        assert!(collection.is_empty());
    }

    #[test]
    fn corrupt_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "[{\"date\": \"2026-01-").unwrap();

        assert!(EventCollection::load(&path).unwrap().is_empty());
    }

    #[test]
    fn duplicate_keys_collapse_on_load() {
        let mut second = event(26, 8, "A");
        second.location = "Salle 3".into();

        let raw = serde_json::to_string(&[event(26, 8, "A"), second.clone()]).unwrap();
        let collection: EventCollection = serde_json::from_str(&raw).unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.iter().next(), Some(&second));
    }
}
