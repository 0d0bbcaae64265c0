//! Year calendar grid with per-day fill colours and tooltips.
//!
//! The grid runs from the start of the week containing Jan 1 to the end of
//! the week containing Dec 31, one column per week and one row per weekday.
//! Days that fall outside the target year are emitted as placeholders so the
//! presentation layer can keep the grid rectangular.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::{self, WeekStart};
use crate::format;
use crate::heat::{discrete_level, Palette, Rgb};
use crate::payload::{DailyAggregate, DayMap, Payload};

/// Which aggregates a grid shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum GridScope {
    /// Unioned aggregates of several types (cells carry `types`).
    Combined,
    /// A single type's aggregates.
    Single(String),
}

impl GridScope {
    /// Directory-friendly name: the type id, or `all`.
    pub fn slug(&self) -> &str {
        match self {
            Self::Combined => "all",
            Self::Single(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarCell {
    pub date: String,
    /// Grid column.
    pub week: u32,
    /// Grid row, 0 = first day of the week.
    pub row: u32,
    /// Placeholder for a day outside the target year.
    pub outside: bool,
    pub count: u64,
    /// Discrete 0..=4 intensity, relative to the busiest day of the year.
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

/// Column where a month's first day lands, for header labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthMarker {
    pub week: u32,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarGrid {
    pub year: i32,
    pub scope: GridScope,
    pub week_start: WeekStart,
    pub weeks: u32,
    pub max_count: u64,
    pub weekday_labels: [&'static str; 7],
    pub months: Vec<MonthMarker>,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    pub fn in_year_cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.cells.iter().filter(|c| !c.outside)
    }

    pub fn cell(&self, date: &str) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.date == date)
    }
}

/// Lay out one year of `days` onto a week-aligned grid.
///
/// `days` is either a single type's map or the output of
/// [`combine_by_date`](crate::aggregate::combine_by_date), matching `scope`.
/// `show_distance` is decided over the whole selection, not this year alone,
/// so every grid of one render carries the same tooltip lines.
/// Returns `None` only for years chrono cannot represent.
pub fn build_calendar(
    payload: &Payload,
    year: i32,
    scope: &GridScope,
    days: &DayMap,
    week_start: WeekStart,
    palette: &Palette,
    show_distance: bool,
) -> Option<CalendarGrid> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let dec31 = NaiveDate::from_ymd_opt(year, 12, 31)?;
    let start = calendar::week_start(jan1, week_start);
    let end = calendar::week_end(dec31, week_start);

    let max_count = days.values().map(|d| d.count).max().unwrap_or(0);
    let single_accent = match scope {
        GridScope::Single(t) => Some(payload.type_accent(t)),
        GridScope::Combined => None,
    };

    let zero = DailyAggregate::default();
    let mut months = Vec::with_capacity(12);
    let cells = calendar::days_between(start, end)
        .map(|date| {
            let week = calendar::week_index(date, start) as u32;
            let row = week_start.day_row(date);
            let key = calendar::date_key(date);

            if date.year() != year {
                return CalendarCell {
                    date: key,
                    week,
                    row,
                    outside: true,
                    count: 0,
                    level: 0,
                    fill: None,
                    tooltip: None,
                };
            }

            if date.day() == 1 {
                months.push(MonthMarker {
                    week,
                    label: calendar::month_label(date.month()),
                });
            }

            let day = days.get(&key).unwrap_or(&zero);
            let fill = match single_accent {
                Some(accent) if day.count > 0 => accent,
                Some(_) => palette.empty,
                None => combined_fill(payload, day, palette),
            };
            let tooltip = day_tooltip(payload, &key, day, scope, show_distance);

            CalendarCell {
                date: key,
                week,
                row,
                outside: false,
                count: day.count,
                level: discrete_level(day.count, max_count),
                fill: Some(fill),
                tooltip: Some(tooltip),
            }
        })
        .collect();

    Some(CalendarGrid {
        year,
        scope: scope.clone(),
        week_start,
        weeks: calendar::week_index(end, start) as u32 + 1,
        max_count,
        weekday_labels: week_start.labels(),
        months,
        cells,
    })
}

/// No contributing type → empty, one → its accent, several → the
/// multi-type colour.
fn combined_fill(payload: &Payload, day: &DailyAggregate, palette: &Palette) -> Rgb {
    let contributors = day.types.as_ref();
    match contributors.map_or(0, |t| t.len()) {
        0 => palette.empty,
        1 => contributors
            .and_then(|t| t.iter().next())
            .map_or(palette.empty, |t| payload.type_accent(t)),
        _ => palette.multi_type,
    }
}

fn day_tooltip(
    payload: &Payload,
    date: &str,
    day: &DailyAggregate,
    scope: &GridScope,
    show_distance: bool,
) -> String {
    let mut lines = vec![date.to_string(), format::activities(day.count)];

    if *scope == GridScope::Combined {
        if let Some(types) = day.types.as_ref().filter(|t| !t.is_empty()) {
            let labels: Vec<String> = payload
                .types
                .iter()
                .filter(|t| types.contains(*t))
                .map(|t| payload.type_label(t))
                .collect();
            lines.push(format!("Types: {}", labels.join(", ")));
        }
    }

    if show_distance {
        lines.push(format!(
            "Distance: {}",
            format::format_distance(day.distance, payload.units.distance)
        ));
        lines.push(format!(
            "Elevation: {}",
            format::format_elevation(day.elevation_gain, payload.units.elevation)
        ));
    }
    lines.push(format!("Duration: {}", format::format_duration(day.moving_time)));
    lines.join("\n")
}

// ─── tests ───────────────────────────────────────────────────────────────
