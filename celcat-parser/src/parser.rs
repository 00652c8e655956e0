use chrono::NaiveDate;
use log::{debug, warn};
use scraper::{ElementRef, Html};

use crate::grid::{cell_span, page_year};
use crate::{
    classify, column_from_style, parse_time, parse_time_range, tokens, DateTable, Event,
    Extraction, GridOccupancy, Placement, TimeRange,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Year used for text-only column headers when the page title has none.
    pub fallback_year: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_year: 2026,
        }
    }
}

/// Decodes whichever grid the document contains: the week time-grid if
/// present, otherwise the month day-grid. Documents without a grid yield an
/// empty extraction.
pub fn parse_calendar<S: AsRef<str>>(s: S, config: &Config) -> Extraction {
    let html = Html::parse_document(s.as_ref());

    let extraction = if html.select(selector!(".fc-time-grid")).next().is_some() {
        week_view(&html, config)
    } else if html.select(selector!(".fc-day-grid")).next().is_some() {
        month_view(&html, config)
    } else {
        warn!("Document contains no calendar grid");
        Extraction::default()
    };

    debug!(
        "Extracted {} events, dropped {} blocks",
        extraction.events.len(),
        extraction.dropped
    );

    extraction
}

pub fn parse_week_view<S: AsRef<str>>(s: S, config: &Config) -> Extraction {
    week_view(&Html::parse_document(s.as_ref()), config)
}

pub fn parse_month_view<S: AsRef<str>>(s: S, config: &Config) -> Extraction {
    month_view(&Html::parse_document(s.as_ref()), config)
}

fn week_view(html: &Html, config: &Config) -> Extraction {
    let year = page_year(html, config.fallback_year);
    let dates = DateTable::from_headers(html.select(selector!("th.fc-day-header")), year);

    let mut extraction = Extraction::default();
    if dates.is_empty() {
        warn!("Week view has no dated column headers");
        return extraction;
    }

    let columns = html
        .select(selector!(".fc-time-grid .fc-content-skeleton tr"))
        .next()
        .map(|row| {
            table_cells(row)
                .filter(|cell| !has_class(cell, "fc-axis"))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if columns.is_empty() {
        debug!("No skeleton columns, placing events by their offset");

        for block in html.select(selector!(".fc-time-grid a.fc-time-grid-event")) {
            let date = block
                .value()
                .attr("style")
                .and_then(|style| column_from_style(style, dates.columns()))
                .and_then(|column| dates.get(column));

            push_block(&mut extraction, block, date);
        }

        return extraction;
    }

    for (column, cell) in columns.into_iter().enumerate() {
        for block in cell.select(selector!("a.fc-time-grid-event")) {
            push_block(&mut extraction, block, dates.get(column));
        }
    }

    extraction
}

fn month_view(html: &Html, config: &Config) -> Extraction {
    let year = page_year(html, config.fallback_year);
    let mut extraction = Extraction::default();

    for week in html.select(selector!(".fc-day-grid .fc-content-skeleton")) {
        let dates = DateTable::from_headers(week.select(selector!("thead td.fc-day-top")), year);
        if dates.is_empty() {
            debug!("Skipping week row without dated headers");
            continue;
        }

        let mut occupancy = GridOccupancy::new(dates.columns());

        for row in week.select(selector!("tbody > tr")) {
            for Placement { column, cell } in
                occupancy.place_row(table_cells(row), |cell| cell_span(cell))
            {
                if !has_class(&cell, "fc-event-container") {
                    continue;
                }

                for block in cell.select(selector!("a.fc-day-grid-event")) {
                    push_block(&mut extraction, block, dates.get(column));
                }
            }
        }
    }

    extraction
}

fn push_block(extraction: &mut Extraction, block: ElementRef, date: Option<NaiveDate>) {
    match date.and_then(|date| parse_event_block(block, date)) {
        Some(event) => extraction.events.push(event),
        None => {
            debug!("Dropping event block {:?}", block.value().attr("href"));
            extraction.dropped += 1;
        }
    }
}

fn parse_event_block(block: ElementRef, date: NaiveDate) -> Option<Event> {
    let content = block.select(selector!(".fc-content")).next().unwrap_or(block);
    let fields = classify(tokens(content))?;
    let times = block
        .select(selector!(".fc-time"))
        .next()
        .and_then(read_time_range)?;

    Some(Event::assemble(date, times, fields))
}

/// Prefers `data-full`, then `data-start`, then the visible text.
fn read_time_range(element: ElementRef) -> Option<TimeRange> {
    let text = element.text().collect::<String>();

    if let Some(range) = element.value().attr("data-full").and_then(parse_time_range) {
        return Some(range);
    }

    if let Some(start) = element.value().attr("data-start").and_then(parse_time) {
        let end = parse_time_range(&text).and_then(|range| range.end);
        return Some(TimeRange { start, end });
    }

    parse_time_range(&text)
}

fn table_cells<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| cell.value().name() == "td")
}

fn has_class(element: &ElementRef, class: &str) -> bool {
    element.value().classes().any(|name| name == class)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn block(time: &str, content: &str) -> String {
        format!(
            r#"<a class="fc-time-grid-event"><div class="fc-content">{time}{content}</div></a>"#
        )
    }

    fn first_block(html: &Html) -> ElementRef<'_> {
        html.select(selector!("a")).next().unwrap()
    }

    #[test]
    fn reads_full_range_attribute_before_text() {
        let html = Html::parse_fragment(&block(
            r#"<div class="fc-time" data-full="2:00 PM - 3:30 PM"><span>14:00 - 15:00</span></div>"#,
            "Anatomy",
        ));

        let event = parse_event_block(first_block(&html), date(26)).unwrap();
        assert_eq!(event.start_time, hm(14, 0));
        assert_eq!(event.end_time, Some(hm(15, 30)));
    }

    #[test]
    fn reads_start_attribute_with_end_from_text() {
        let html = Html::parse_fragment(&block(
            r#"<div class="fc-time" data-start="08:35"><span>08:35 - 10:30</span></div>"#,
            "Anatomy",
        ));

        let event = parse_event_block(first_block(&html), date(26)).unwrap();
        assert_eq!(event.start_time, hm(8, 35));
        assert_eq!(event.end_time, Some(hm(10, 30)));
    }

    #[test]
    fn falls_back_to_visible_text() {
        let html = Html::parse_fragment(&block(r#"<span class="fc-time">8:30a</span>"#, "Anatomy"));

        let event = parse_event_block(first_block(&html), date(26)).unwrap();
        assert_eq!(event.start_time, hm(8, 30));
        assert_eq!(event.end_time, None);
        assert_eq!(event.title, "Anatomy");
    }

    #[test]
    fn blocks_without_start_time_are_dropped() {
        let html = Html::parse_fragment(&block(r#"<span class="fc-time">all day</span>"#, "Anatomy"));
        assert_eq!(parse_event_block(first_block(&html), date(26)), None);

        let html = Html::parse_fragment(&block("", "Anatomy"));
        assert_eq!(parse_event_block(first_block(&html), date(26)), None);
    }

    #[test]
    fn blocks_without_text_are_dropped() {
        let html = Html::parse_fragment(&block(
            r#"<div class="fc-time" data-full="08:00 - 09:00"><span>08:00 - 09:00</span></div>"#,
            "<br>",
        ));
        assert_eq!(parse_event_block(first_block(&html), date(26)), None);
    }

    #[test]
    fn document_without_grid_is_empty() {
        let extraction = parse_calendar("<html><body><p>Login</p></body></html>", &Config::default());
        assert_eq!(extraction, Extraction::default());
    }
}
