//! The recompute pipeline: payload + filter state → render model.
//!
//! [`recompute`] is pure over a read-only payload. The interactive layer
//! owns the mutable [`FilterState`] and calls it again after every change;
//! nothing is cached between calls.

use serde::Serialize;
use tracing::debug;

use crate::aggregate::combine_year;
use crate::calendar::WeekStart;
use crate::filter::FilterState;
use crate::grid::{build_calendar, CalendarGrid, GridScope};
use crate::heat::{Palette, Rgb};
use crate::payload::{Payload, Units};
use crate::stats::{build_statistics, MatrixCell, Statistics};
use crate::summary::{build_summary, Summary};

/// Presentation conventions the engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Week layout of the calendar grid.
    pub calendar_week_start: WeekStart,
    /// Column order of the day-of-week matrix.
    pub stats_week_start: WeekStart,
    pub palette: Palette,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            calendar_week_start: WeekStart::Monday,
            stats_week_start: WeekStart::Sunday,
            palette: Palette::default(),
        }
    }
}

/// Render-ready matrix cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCells {
    pub day_of_week: Vec<MatrixCell>,
    pub month: Vec<MatrixCell>,
    /// `None` when time-of-day data is missing.
    pub hour: Option<Vec<MatrixCell>>,
}

/// Everything the presentation layer paints for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    pub types: Vec<String>,
    /// Years offered by the year filter, newest first.
    pub visible_years: Vec<i32>,
    /// Years actually rendered, newest first.
    pub years: Vec<i32>,
    pub units: Units,
    pub summary: Summary,
    /// One grid per rendered year, newest first.
    pub calendars: Vec<CalendarGrid>,
    pub statistics: Statistics,
    pub matrix_cells: MatrixCells,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl RenderModel {
    pub fn calendar(&self, year: i32) -> Option<&CalendarGrid> {
        self.calendars.iter().find(|g| g.year == year)
    }
}

/// Grid scope for a resolved type list: a single type keeps its own
/// aggregates, anything more is unioned per date.
pub fn scope_for(types: &[String]) -> GridScope {
    match types {
        [only] => GridScope::Single(only.clone()),
        _ => GridScope::Combined,
    }
}

/// Base colour of the frequency matrices.
fn matrix_accent(payload: &Payload, scope: &GridScope, palette: &Palette) -> Rgb {
    match scope {
        GridScope::Single(t) => payload.type_accent(t),
        GridScope::Combined => palette.multi_type,
    }
}

pub fn recompute(payload: &Payload, state: &FilterState, options: &ViewOptions) -> RenderModel {
    let types = state.resolved_types(payload);
    let visible_years = state.visible_years(payload);
    let years = state.resolved_years(payload);
    let scope = scope_for(&types);
    debug!("Recompute: types={types:?} years={years:?} scope={}", scope.slug());

    let summary = build_summary(payload, &types, &years);
    let show_distance = summary.totals.reports_distance();
    let calendars = years
        .iter()
        .filter_map(|&year| {
            let days = match &scope {
                GridScope::Single(t) => payload.day_map(year, t).cloned().unwrap_or_default(),
                GridScope::Combined => combine_year(payload, year, &types),
            };
            build_calendar(
                payload,
                year,
                &scope,
                &days,
                options.calendar_week_start,
                &options.palette,
                show_distance,
            )
        })
        .collect();

    let statistics = build_statistics(payload, &types, &years, options.stats_week_start);
    let accent = matrix_accent(payload, &scope, &options.palette);
    let matrix_cells = MatrixCells {
        day_of_week: statistics.day_of_week.cells(payload, accent, &options.palette),
        month: statistics.month.cells(payload, accent, &options.palette),
        hour: statistics
            .hour
            .matrix()
            .map(|m| m.cells(payload, accent, &options.palette)),
    };

    RenderModel {
        summary,
        types,
        visible_years,
        years,
        units: payload.units,
        calendars,
        statistics,
        matrix_cells,
        generated_at: payload.generated_at.clone(),
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
