//! Calendar arithmetic shared by the grid builder and the statistics engine.
//!
//! Everything here works on [`NaiveDate`], i.e. on local calendar fields.
//! No timezone conversion ever happens, so a date key always names the day
//! the activity was recorded on.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Which weekday opens a grid week.
///
/// The calendar grid lays weeks out Monday-first while the day-of-week
/// statistics list columns Sunday-first; both go through this one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    /// Parse `monday` / `sunday` (case-insensitive, `mon` / `sun` accepted).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Some(Self::Monday),
            "sunday" | "sun" => Some(Self::Sunday),
            _ => None,
        }
    }

    /// Row of `date` inside its week: 0 for the first day, 6 for the last.
    pub fn day_row(self, date: NaiveDate) -> u32 {
        match self {
            Self::Monday => date.weekday().num_days_from_monday(),
            Self::Sunday => date.weekday().num_days_from_sunday(),
        }
    }

    /// The seven weekdays in grid order.
    pub fn weekdays(self) -> [Weekday; 7] {
        use Weekday::*;
        match self {
            Self::Monday => [Mon, Tue, Wed, Thu, Fri, Sat, Sun],
            Self::Sunday => [Sun, Mon, Tue, Wed, Thu, Fri, Sat],
        }
    }

    /// Short weekday labels in grid order.
    pub fn labels(self) -> [&'static str; 7] {
        self.weekdays().map(weekday_label)
    }
}

/// The first day of the week containing `date`.
pub fn week_start(date: NaiveDate, convention: WeekStart) -> NaiveDate {
    date - Days::new(convention.day_row(date) as u64)
}

/// The last day of the week containing `date`.
pub fn week_end(date: NaiveDate, convention: WeekStart) -> NaiveDate {
    date + Days::new(6 - convention.day_row(date) as u64)
}

/// `YYYY-MM-DD`, zero padded.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Inverse of [`date_key`]. Returns `None` for anything that is not a valid
/// calendar date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Number of whole weeks between `grid_start` and `date`, floored.
pub fn week_index(date: NaiveDate, grid_start: NaiveDate) -> i64 {
    (date - grid_start).num_days().div_euclid(7)
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Iterate every date from `start` to `end` inclusive.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

pub fn month_label(m: u32) -> &'static str {
    match m {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "?",
    }
}

pub fn weekday_label(d: Weekday) -> &'static str {
    match d {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
