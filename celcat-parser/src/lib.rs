//! Decoding of Celcat/FullCalendar timetable grids into structured events,
//! and reconciliation of repeated extractions against a persisted store.

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: once_cell::sync::Lazy<scraper::Selector> =
            once_cell::sync::Lazy::new(|| scraper::Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

macro_rules! regex {
    ($pattern:expr) => {{
        static REGEX: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pattern).unwrap());
        &REGEX
    }};
}

mod classifier;
mod error;
mod grid;
mod parser;
mod reconcile;
mod store;
mod structs;
mod time;
mod tokens;

pub use classifier::{classify, Fields};
pub use error::{Error, Result};
pub use grid::{column_from_style, DateTable, GridOccupancy, Placement};
pub use parser::{parse_calendar, parse_month_view, parse_week_view, Config};
pub use reconcile::{reconcile, Change, ChangeReport, Reconciliation};
pub use store::EventCollection;
pub use structs::{Event, EventKey, Extraction};
pub use time::{normalize_time, parse_time, parse_time_range, TimeRange};
pub use tokens::{is_time_token, tokens, Tokens};
