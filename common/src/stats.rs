//! Frequency statistics: year × bucket matrices for day of week, month and
//! hour of day, plus the "best day / best month / peak hour" facts.
//!
//! Day-of-week and month matrices are derived from the daily aggregates.
//! The hour matrix needs raw activities; without them it reports
//! [`HourStats::InsufficientData`] instead of a grid of zeros, because
//! "unknown" and "never" are not the same answer.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::calendar::{self, WeekStart};
use crate::format;
use crate::heat::{heat_color, Palette, Rgb};
use crate::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    DayOfWeek,
    Month,
    Hour,
}

/// Counts per (year, bucket).
///
/// When more than one type is in scope, `breakdown` holds the per-type
/// split of every cell and always sums to the matching `values` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyMatrix {
    pub kind: MatrixKind,
    /// Years, newest first.
    pub rows: Vec<i32>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<Vec<BTreeMap<String, u64>>>>,
}

/// One render-ready matrix cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCell {
    pub row: usize,
    pub col: usize,
    pub year: i32,
    pub label: String,
    pub value: u64,
    pub color: Rgb,
    pub tooltip: String,
}

impl FrequencyMatrix {
    fn new(kind: MatrixKind, years: &[i32], columns: Vec<String>, with_breakdown: bool) -> Self {
        let mut rows = years.to_vec();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();
        let width = columns.len();
        let breakdown = with_breakdown.then(|| vec![vec![BTreeMap::new(); width]; rows.len()]);
        FrequencyMatrix {
            kind,
            values: vec![vec![0; width]; rows.len()],
            rows,
            columns,
            breakdown,
        }
    }

    fn add(&mut self, year: i32, col: usize, type_id: &str, count: u64) {
        if count == 0 || col >= self.columns.len() {
            return;
        }
        let Some(row) = self.rows.iter().position(|&y| y == year) else {
            return;
        };
        self.values[row][col] += count;
        if let Some(breakdown) = &mut self.breakdown {
            *breakdown[row][col].entry(type_id.to_string()).or_insert(0) += count;
        }
    }

    pub fn row_total(&self, row: usize) -> u64 {
        self.values.get(row).map_or(0, |r| r.iter().sum())
    }

    pub fn column_totals(&self) -> Vec<u64> {
        let mut totals = vec![0; self.columns.len()];
        for row in &self.values {
            for (total, v) in totals.iter_mut().zip(row) {
                *total += v;
            }
        }
        totals
    }

    pub fn max_value(&self) -> u64 {
        self.values.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().flatten().all(|&v| v == 0)
    }

    /// Column with the largest total across all rows; the leftmost wins
    /// ties. `None` when every cell is zero.
    pub fn best_bucket(&self) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for (col, total) in self.column_totals().into_iter().enumerate() {
            if total > 0 && best.map_or(true, |(_, b)| total > b) {
                best = Some((col, total));
            }
        }
        best.map(|(col, _)| col)
    }

    pub fn best_label(&self) -> Option<String> {
        self.best_bucket().map(|c| self.columns[c].clone())
    }

    /// Heat-coloured cells with tooltips, row by row.
    pub fn cells(&self, payload: &Payload, base: Rgb, palette: &Palette) -> Vec<MatrixCell> {
        let max = self.max_value() as f64;
        let mut cells = Vec::with_capacity(self.rows.len() * self.columns.len());
        for (row, &year) in self.rows.iter().enumerate() {
            for (col, label) in self.columns.iter().enumerate() {
                let value = self.values[row][col];
                let mut tooltip = format!("{year} · {label}\n{}", format::activities(value));
                if let Some(split) = self.breakdown.as_ref().map(|b| &b[row][col]) {
                    for type_id in &payload.types {
                        if let Some(n) = split.get(type_id) {
                            tooltip.push_str(&format!("\n{}: {n}", payload.type_label(type_id)));
                        }
                    }
                }
                cells.push(MatrixCell {
                    row,
                    col,
                    year,
                    label: label.clone(),
                    value,
                    color: heat_color(base, value as f64, max, palette),
                    tooltip,
                });
            }
        }
        cells
    }
}

/// Hour-of-day statistics, or the explicit absence of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "matrix", rename_all = "snake_case")]
pub enum HourStats {
    Available(FrequencyMatrix),
    InsufficientData,
}

impl HourStats {
    pub fn matrix(&self) -> Option<&FrequencyMatrix> {
        match self {
            Self::Available(m) => Some(m),
            Self::InsufficientData => None,
        }
    }
}

// ─── builders ────────────────────────────────────────────────────────────────

pub fn hour_labels() -> Vec<String> {
    (0..24).map(|h| format!("{h:02}:00")).collect()
}

/// Feed every non-zero daily aggregate of the selection into `matrix`,
/// bucketed by `bucket(date)`.
fn bucket_days(
    payload: &Payload,
    types: &[String],
    years: &[i32],
    matrix: &mut FrequencyMatrix,
    bucket: impl Fn(NaiveDate) -> usize,
) {
    for &year in years {
        for type_id in types {
            let Some(days) = payload.day_map(year, type_id) else {
                continue;
            };
            for (key, day) in days {
                if day.count == 0 {
                    continue;
                }
                let Some(date) = calendar::parse_date_key(key) else {
                    debug!("Skipping unparseable date key {key:?} ({type_id}, {year})");
                    continue;
                };
                matrix.add(year, bucket(date), type_id, day.count);
            }
        }
    }
}

/// Day-of-week matrix; columns follow `week_start`.
pub fn day_of_week_matrix(
    payload: &Payload,
    types: &[String],
    years: &[i32],
    week_start: WeekStart,
) -> FrequencyMatrix {
    let columns = week_start.labels().iter().map(|s| s.to_string()).collect();
    let mut matrix = FrequencyMatrix::new(MatrixKind::DayOfWeek, years, columns, types.len() > 1);
    bucket_days(payload, types, years, &mut matrix, |d| {
        week_start.day_row(d) as usize
    });
    matrix
}

pub fn month_matrix(payload: &Payload, types: &[String], years: &[i32]) -> FrequencyMatrix {
    let columns = (1..=12).map(|m| calendar::month_label(m).to_string()).collect();
    let mut matrix = FrequencyMatrix::new(MatrixKind::Month, years, columns, types.len() > 1);
    bucket_days(payload, types, years, &mut matrix, |d| d.month0() as usize);
    matrix
}

/// Hour-of-day matrix from raw activities.
///
/// Reports [`HourStats::InsufficientData`] when the payload has no activity
/// with a usable hour. Individual records with a bad hour are skipped.
pub fn hour_matrix(payload: &Payload, types: &[String], years: &[i32]) -> HourStats {
    if !payload.has_hour_data() {
        return HourStats::InsufficientData;
    }
    let Some(activities) = payload.activities.as_ref() else {
        return HourStats::InsufficientData;
    };

    let mut matrix = FrequencyMatrix::new(MatrixKind::Hour, years, hour_labels(), types.len() > 1);
    for activity in activities {
        if !types.contains(&activity.activity_type) {
            continue;
        }
        let Some(year) = activity.year else {
            debug!("Skipping {} activity without a usable year", activity.activity_type);
            continue;
        };
        if !years.contains(&year) {
            continue;
        }
        match activity.hour_bucket() {
            Some(hour) => matrix.add(year, hour, &activity.activity_type, 1),
            None => debug!(
                "Skipping {} activity in {year} with hour {:?}",
                activity.activity_type, activity.hour
            ),
        }
    }
    HourStats::Available(matrix)
}

// ─── facts ───────────────────────────────────────────────────────────────────

/// Headline facts derived from the matrices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsFacts {
    pub best_day: Option<String>,
    pub best_month: Option<String>,
    pub peak_hour: Option<String>,
    /// `false` when time-of-day data is missing.
    pub hour_data: bool,
}

/// All three matrices for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub day_of_week: FrequencyMatrix,
    pub month: FrequencyMatrix,
    pub hour: HourStats,
    pub facts: StatsFacts,
}

pub fn build_statistics(
    payload: &Payload,
    types: &[String],
    years: &[i32],
    week_start: WeekStart,
) -> Statistics {
    let day_of_week = day_of_week_matrix(payload, types, years, week_start);
    let month = month_matrix(payload, types, years);
    let hour = hour_matrix(payload, types, years);
    let facts = StatsFacts {
        best_day: day_of_week.best_label(),
        best_month: month.best_label(),
        peak_hour: hour.matrix().and_then(FrequencyMatrix::best_label),
        hour_data: hour.matrix().is_some(),
    };
    Statistics {
        day_of_week,
        month,
        hour,
        facts,
    }
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-01 Mon, 2024-01-02 Tue, 2024-01-07 Sun, 2023-03-05 Sun.
    fn payload(activities: &str) -> Payload {
        Payload::from_json(&format!(
            r#"{{
            "types": ["run", "ride"],
            "years": [2023, 2024],
            "aggregates": {{
                "2023": {{"run": {{"2023-03-05": {{"count": 4}}}}}},
                "2024": {{
                    "run": {{
                        "2024-01-01": {{"count": 2}},
                        "2024-01-07": {{"count": 1}},
                        "2024-02-10": {{"count": 0}}
                    }},
                    "ride": {{
                        "2024-01-01": {{"count": 1}},
                        "2024-01-02": {{"count": 3}}
                    }}
                }}
            }}
            {activities}
        }}"#
        ))
        .unwrap()
    }

    fn both() -> Vec<String> {
        vec!["run".into(), "ride".into()]
    }

    #[test]
    fn test_day_of_week_monday_first() {
        let p = payload("");
        let m = day_of_week_matrix(&p, &both(), &[2023, 2024], WeekStart::Monday);
        assert_eq!(m.rows, vec![2024, 2023]);
        assert_eq!(m.columns[0], "Mon");
        assert_eq!(m.values[0], vec![3, 3, 0, 0, 0, 0, 1]);
        assert_eq!(m.values[1], vec![0, 0, 0, 0, 0, 0, 4]);
    }

    #[test]
    fn test_day_of_week_sunday_first() {
        let p = payload("");
        let m = day_of_week_matrix(&p, &both(), &[2024], WeekStart::Sunday);
        assert_eq!(m.columns[0], "Sun");
        assert_eq!(m.values[0], vec![1, 3, 3, 0, 0, 0, 0]);
    }

    #[test]
    fn test_rows_conserve_year_totals() {
        let p = payload("");
        let years = [2024, 2023];
        let dow = day_of_week_matrix(&p, &both(), &years, WeekStart::Sunday);
        let month = month_matrix(&p, &both(), &years);
        for (row, &year) in dow.rows.iter().enumerate() {
            assert_eq!(dow.row_total(row), p.year_count(year, &both()));
            assert_eq!(month.row_total(row), p.year_count(year, &both()));
        }
    }

    #[test]
    fn test_breakdown_sums_to_values() {
        let p = payload("");
        let m = month_matrix(&p, &both(), &[2024, 2023]);
        let breakdown = m.breakdown.as_ref().unwrap();
        for (r, row) in m.values.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                assert_eq!(breakdown[r][c].values().sum::<u64>(), *v);
            }
        }
        assert_eq!(breakdown[0][0]["run"], 3);
        assert_eq!(breakdown[0][0]["ride"], 4);
        assert!(breakdown[0][1].is_empty());
    }

    #[test]
    fn test_single_type_has_no_breakdown() {
        let p = payload("");
        let m = month_matrix(&p, &["run".into()], &[2024]);
        assert!(m.breakdown.is_none());
        assert_eq!(m.values[0][0], 3);
    }

    #[test]
    fn test_best_bucket_first_occurrence_wins() {
        let p = payload("");
        let m = day_of_week_matrix(&p, &both(), &[2024], WeekStart::Monday);
        // Mon and Tue both total 3.
        assert_eq!(m.best_bucket(), Some(0));
        assert_eq!(m.best_label().as_deref(), Some("Mon"));

        let none = month_matrix(&p, &both(), &[2022]);
        assert!(none.rows.contains(&2022));
        assert_eq!(none.best_bucket(), None);
    }

    #[test]
    fn test_hour_matrix_without_activities_is_insufficient() {
        let p = payload("");
        assert_eq!(hour_matrix(&p, &both(), &[2024]), HourStats::InsufficientData);
        let p = payload(r#", "activities": []"#);
        assert_eq!(hour_matrix(&p, &both(), &[2024]), HourStats::InsufficientData);
    }

    #[test]
    fn test_hour_matrix_skips_bad_hours() {
        let p = payload(
            r#", "activities": [
                {"type": "run", "year": 2024, "hour": 6},
                {"type": "run", "year": 2024, "hour": 6},
                {"type": "ride", "year": 2024, "hour": 18},
                {"type": "ride", "year": 2024, "hour": 31},
                {"type": "ride", "year": 2024, "hour": "18"},
                {"type": "run", "year": "2024", "hour": 6},
                {"type": "run", "hour": 6},
                {"type": "run", "year": 2023, "hour": 7},
                {"type": "swim", "year": 2024, "hour": 9}
            ]"#,
        );
        let stats = hour_matrix(&p, &both(), &[2024]);
        let m = stats.matrix().unwrap();
        assert_eq!(m.columns.len(), 24);
        assert_eq!(m.rows, vec![2024]);
        assert_eq!(m.values[0][6], 2);
        assert_eq!(m.values[0][18], 1);
        assert_eq!(m.row_total(0), 3);
        assert_eq!(m.best_label().as_deref(), Some("06:00"));
    }

    #[test]
    fn test_build_statistics_facts() {
        let p = payload(r#", "activities": [{"type": "run", "year": 2023, "hour": 21}]"#);
        let stats = build_statistics(&p, &both(), &[2024, 2023], WeekStart::Monday);
        assert_eq!(stats.facts.best_day.as_deref(), Some("Sun"));
        assert_eq!(stats.facts.best_month.as_deref(), Some("Jan"));
        assert_eq!(stats.facts.peak_hour.as_deref(), Some("21:00"));
        assert!(stats.facts.hour_data);

        let bare = build_statistics(&payload(""), &both(), &[2024], WeekStart::Monday);
        assert!(!bare.facts.hour_data);
        assert_eq!(bare.facts.peak_hour, None);
    }

    #[test]
    fn test_cells_carry_heat_and_breakdown() {
        let p = payload("");
        let palette = Palette::default();
        let base = Rgb::new(0xfc, 0x4c, 0x02);
        let m = month_matrix(&p, &both(), &[2024]);
        let cells = m.cells(&p, base, &palette);
        assert_eq!(cells.len(), 12);
        let jan = &cells[0];
        assert_eq!(jan.value, 7);
        assert_eq!(jan.color, base);
        assert!(jan.tooltip.starts_with("2024 · Jan\n7 activities"));
        assert!(jan.tooltip.contains("Run: 3"));
        assert!(jan.tooltip.contains("Ride: 4"));
        assert_eq!(cells[1].color, palette.zero);
    }
}
