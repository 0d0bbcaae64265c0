//! Combinators that merge per-type daily aggregates into unioned totals.
//!
//! Dates that no input mentions stay absent from the output; callers treat
//! a missing date as an all-zero [`DailyAggregate`].

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use serde::Serialize;

use crate::payload::{DailyAggregate, DayMap, Payload};

/// Field-wise sums of a set of daily aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub count: u64,
    pub distance: f64,
    pub moving_time: f64,
    pub elevation: f64,
}

impl Totals {
    /// Whether distance or elevation figures are worth showing. Types such
    /// as strength training never report either.
    pub fn reports_distance(&self) -> bool {
        self.distance > 0.0 || self.elevation > 0.0
    }
}

impl AddAssign<&DailyAggregate> for Totals {
    fn add_assign(&mut self, day: &DailyAggregate) {
        self.count += day.count;
        self.distance += day.distance;
        self.moving_time += day.moving_time;
        self.elevation += day.elevation_gain;
    }
}

fn absorb(into: &mut DailyAggregate, day: &DailyAggregate) {
    into.count += day.count;
    into.distance += day.distance;
    into.moving_time += day.moving_time;
    into.elevation_gain += day.elevation_gain;
    into.activity_ids.extend(day.activity_ids.iter().cloned());
}

/// Union the daily maps of `types` within one year.
///
/// Every output entry carries a `types` set naming exactly the types that
/// contributed a non-zero count on that date.
pub fn combine_by_date(by_type: &BTreeMap<String, DayMap>, types: &[String]) -> DayMap {
    let mut combined = DayMap::new();
    for type_id in types {
        let Some(days) = by_type.get(type_id) else {
            continue;
        };
        for (date, day) in days {
            let entry = combined.entry(date.clone()).or_insert_with(|| DailyAggregate {
                types: Some(BTreeSet::new()),
                ..DailyAggregate::default()
            });
            absorb(entry, day);
            if day.count > 0 {
                entry
                    .types
                    .get_or_insert_with(BTreeSet::new)
                    .insert(type_id.clone());
            }
        }
    }
    combined
}

/// [`combine_by_date`] for one year of a payload; empty when the year has
/// no aggregates.
pub fn combine_year(payload: &Payload, year: i32, types: &[String]) -> DayMap {
    payload
        .aggregates
        .get(&year)
        .map(|by_type| combine_by_date(by_type, types))
        .unwrap_or_default()
}

/// Union `types` across several `years` into one date map. The result has
/// no per-day type attribution and is meant for scalar summation.
pub fn combine_across_years(payload: &Payload, types: &[String], years: &[i32]) -> DayMap {
    let mut combined = DayMap::new();
    for &year in years {
        for type_id in types {
            let Some(days) = payload.day_map(year, type_id) else {
                continue;
            };
            for (date, day) in days {
                absorb(combined.entry(date.clone()).or_default(), day);
            }
        }
    }
    combined
}

pub fn sum_totals(days: &DayMap) -> Totals {
    let mut totals = Totals::default();
    for day in days.values() {
        totals += day;
    }
    totals
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        Payload::from_json(
            r#"{
            "types": ["run", "ride", "swim"],
            "years": [2023, 2024],
            "aggregates": {
                "2023": {
                    "run": {"2023-12-31": {"count": 1, "distance": 5000.0, "moving_time": 1500.0}}
                },
                "2024": {
                    "run": {
                        "2024-01-01": {"count": 1, "distance": 5000.0, "moving_time": 1500.0,
                                       "activity_ids": [1]},
                        "2024-01-02": {"count": 2, "distance": 8000.0, "moving_time": 2400.0}
                    },
                    "ride": {
                        "2024-01-01": {"count": 1, "distance": 20000.0, "moving_time": 3600.0,
                                       "elevation_gain": 120.0, "activity_ids": [2]},
                        "2024-01-03": {"count": 0}
                    }
                }
            }
        }"#,
        )
        .unwrap()
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_combine_by_date_conserves_counts() {
        let p = payload();
        let types = ids(&["run", "ride"]);
        let combined = combine_year(&p, 2024, &types);

        for (date, day) in &combined {
            let expected: u64 = types
                .iter()
                .filter_map(|t| p.day_map(2024, t).and_then(|m| m.get(date)))
                .map(|a| a.count)
                .sum();
            assert_eq!(day.count, expected, "count mismatch on {date}");
        }

        let jan1 = &combined["2024-01-01"];
        assert_eq!(jan1.count, 2);
        assert_eq!(jan1.distance, 25000.0);
        assert_eq!(jan1.activity_ids.len(), 2);
        assert_eq!(jan1.types.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_types_only_lists_nonzero_contributors() {
        let p = payload();
        let combined = combine_year(&p, 2024, &ids(&["run", "ride"]));
        let jan2 = combined["2024-01-02"].types.as_ref().unwrap();
        assert_eq!(jan2.iter().collect::<Vec<_>>(), vec!["run"]);
        // A zero-count entry is carried through but attributes no type.
        let jan3 = &combined["2024-01-03"];
        assert_eq!(jan3.count, 0);
        assert!(jan3.types.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_absent_dates_stay_absent() {
        let p = payload();
        let combined = combine_year(&p, 2024, &ids(&["run"]));
        assert!(!combined.contains_key("2024-01-03"));
        assert!(combine_year(&p, 2022, &ids(&["run"])).is_empty());
        assert!(combine_year(&p, 2024, &ids(&["swim"])).is_empty());
    }

    #[test]
    fn test_combine_across_years_and_sum() {
        let p = payload();
        let all = combine_across_years(&p, &ids(&["run", "ride"]), &[2023, 2024]);
        assert!(all.values().all(|d| d.types.is_none()));
        let totals = sum_totals(&all);
        assert_eq!(totals.count, 5);
        assert_eq!(totals.distance, 38000.0);
        assert_eq!(totals.moving_time, 9000.0);
        assert_eq!(totals.elevation, 120.0);

        let only_2024 = sum_totals(&combine_across_years(&p, &ids(&["run"]), &[2024]));
        assert_eq!(only_2024.count, 3);
    }
}
