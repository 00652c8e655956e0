use chrono::NaiveDate;
use scraper::{ElementRef, Html};

/// Column index to calendar date, left to right, axis columns excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateTable {
    dates: Vec<Option<NaiveDate>>,
}

impl DateTable {
    /// Reads one date per header, preferring the `data-date` attribute and
    /// falling back to a `26/1` style day/month in the header text. Text dates
    /// start in `year` and move to the next year when the month wraps around.
    pub fn from_headers<'a, I>(headers: I, year: i32) -> Self
    where
        I: IntoIterator<Item = ElementRef<'a>>,
    {
        let mut year = year;
        let mut last_month = 0;

        let dates = headers
            .into_iter()
            .map(|header| {
                if let Some(raw) = header.value().attr("data-date") {
                    return parse_iso_date(raw);
                }

                let (day, month) = parse_day_month(&header.text().collect::<String>())?;
                if month < last_month {
                    year += 1;
                }
                last_month = month;

                NaiveDate::from_ymd_opt(year, month, day)
            })
            .collect();

        Self { dates }
    }

    pub fn get(&self, column: usize) -> Option<NaiveDate> {
        self.dates.get(column).copied().flatten()
    }

    pub fn columns(&self) -> usize {
        self.dates.len()
    }

    /// True when not a single column could be dated.
    pub fn is_empty(&self) -> bool {
        self.dates.iter().all(Option::is_none)
    }
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

fn parse_day_month(text: &str) -> Option<(u32, u32)> {
    let captures = regex!(r"(\d{1,2})/(\d{1,2})").captures(text)?;
    Some((captures[1].parse().ok()?, captures[2].parse().ok()?))
}

/// Year shown in the toolbar title (e.g. `26 janv. – 1 févr. 2026`).
pub(crate) fn page_year(html: &Html, fallback: i32) -> i32 {
    html.select(selector!("h2"))
        .find_map(|title| {
            let text = title.text().collect::<String>();
            regex!(r"\b(20\d{2})\b")
                .captures(&text)
                .and_then(|captures| captures[1].parse().ok())
        })
        .unwrap_or(fallback)
}

/// Column of an absolutely positioned event, from its `left: NN%` style.
pub fn column_from_style(style: &str, columns: usize) -> Option<usize> {
    let left = regex!(r"left:\s*(\d+(?:\.\d+)?)%")
        .captures(style)?
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()?;

    let column = (left * columns as f64 / 100.0 + 0.01).floor() as usize;
    (column < columns).then_some(column)
}

/// A physical cell and the visual column it was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<T> {
    pub column: usize,
    pub cell: T,
}

/// Remaining rows each column is still covered by a cell from a previous row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOccupancy {
    remaining: Vec<usize>,
}

impl GridOccupancy {
    pub fn new(columns: usize) -> Self {
        Self {
            remaining: vec![0; columns],
        }
    }

    pub fn remaining(&self, column: usize) -> usize {
        self.remaining.get(column).copied().unwrap_or_default()
    }

    /// Places one table row's physical cells into visual columns.
    ///
    /// Columns still covered from above consume no cell and count down by
    /// one. Every free column takes the next cell; `span` reports that cell's
    /// `(rowspan, colspan)`, and the covered columns are reserved for the
    /// following `rowspan - 1` rows.
    pub fn place_row<T, I, F>(&mut self, cells: I, span: F) -> Vec<Placement<T>>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> (usize, usize),
    {
        let mut cells = cells.into_iter();
        let mut placed = Vec::new();
        let mut column = 0;

        while column < self.remaining.len() {
            if self.remaining[column] > 0 {
                self.remaining[column] -= 1;
                column += 1;
                continue;
            }

            let Some(cell) = cells.next() else {
                column += 1;
                continue;
            };

            let (rows, cols) = span(&cell);
            let end = (column + cols.max(1)).min(self.remaining.len());
            for covered in &mut self.remaining[column..end] {
                *covered = rows.saturating_sub(1);
            }

            placed.push(Placement { column, cell });
            column = end;
        }

        placed
    }
}

/// `(rowspan, colspan)` of a table cell, defaulting to one.
pub(crate) fn cell_span(cell: &ElementRef) -> (usize, usize) {
    let read = |name| {
        cell.value()
            .attr(name)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
    };

    (read("rowspan"), read("colspan"))
}
