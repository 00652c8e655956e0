use std::collections::BTreeMap;
use std::fmt;

use log::info;
use serde::Serialize;

use crate::{Event, EventCollection, EventKey};

/// Counts surfaced to whatever decides whether to republish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeReport {
    pub added: usize,
    pub updated: usize,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(EventKey),
    Updated {
        key: EventKey,
        fields: Vec<&'static str>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub collection: EventCollection,
    pub report: ChangeReport,
    pub changes: Vec<Change>,
}

/// Merges a freshly extracted batch into the stored collection.
///
/// Unknown keys are added, known keys whose record differs in any field are
/// replaced, and stored events absent from the batch are kept. Within the
/// batch the last event for a key wins.
pub fn reconcile<I>(mut collection: EventCollection, batch: I) -> Reconciliation
where
    I: IntoIterator<Item = Event>,
{
    let batch = batch
        .into_iter()
        .map(|event| (event.key(), event))
        .collect::<BTreeMap<_, _>>();

    let mut changes = Vec::new();

    for (key, event) in batch {
        let change = match collection.get(&key) {
            None => Change::Added(key),
            Some(stored) if *stored == event => continue,
            Some(stored) => Change::Updated {
                fields: changed_fields(stored, &event),
                key,
            },
        };

        info!("{change}");
        changes.push(change);
        collection.insert(event);
    }

    let report = ChangeReport::from(changes.as_slice());
    info!(
        "Reconciled {} events: {} added, {} updated",
        collection.len(),
        report.added,
        report.updated
    );

    Reconciliation {
        collection,
        report,
        changes,
    }
}

fn changed_fields(old: &Event, new: &Event) -> Vec<&'static str> {
    let candidates = [
        ("end_time", old.end_time != new.end_time),
        ("course_code", old.course_code != new.course_code),
        ("course_name", old.course_name != new.course_name),
        ("location", old.location != new.location),
        ("teacher", old.teacher != new.teacher),
        ("type", old.kind != new.kind),
        ("groups", old.groups != new.groups),
    ];

    candidates
        .into_iter()
        .filter_map(|(name, differs)| differs.then_some(name))
        .collect()
}

impl From<&[Change]> for ChangeReport {
    fn from(changes: &[Change]) -> Self {
        let added = changes
            .iter()
            .filter(|change| matches!(change, Change::Added(_)))
            .count();
        let updated = changes.len() - added;

        Self {
            added,
            updated,
            changed: !changes.is_empty(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added(key) => write!(f, "Added {key}"),
            Change::Updated { key, fields } => {
                write!(f, "Updated {key} ({})", fields.join(", "))
            }
        }
    }
}
