//! Headline totals for the current selection.

use serde::Serialize;

use crate::aggregate::{combine_across_years, sum_totals, Totals};
use crate::format;
use crate::heat::Rgb;
use crate::payload::Payload;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<Rgb>,
}

impl SummaryCard {
    fn new(label: &str, value: String) -> Self {
        SummaryCard {
            label: label.to_string(),
            value,
            type_id: None,
            accent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub totals: Totals,
    /// Distinct dates with at least one activity.
    pub active_days: usize,
    pub cards: Vec<SummaryCard>,
    /// One count card per type, in payload order. Empty for a single type.
    pub type_cards: Vec<SummaryCard>,
}

pub fn build_summary(payload: &Payload, types: &[String], years: &[i32]) -> Summary {
    let days = combine_across_years(payload, types, years);
    let totals = sum_totals(&days);
    let active_days = days.values().filter(|d| d.count > 0).count();

    let mut cards = vec![
        SummaryCard::new("Activities", totals.count.to_string()),
        SummaryCard::new("Active days", active_days.to_string()),
        SummaryCard::new("Time", format::format_duration(totals.moving_time)),
    ];
    if totals.reports_distance() {
        cards.push(SummaryCard::new(
            "Distance",
            format::format_distance(totals.distance, payload.units.distance),
        ));
        cards.push(SummaryCard::new(
            "Elevation",
            format::format_elevation(totals.elevation, payload.units.elevation),
        ));
    }

    let type_cards = if types.len() > 1 {
        payload
            .types
            .iter()
            .filter(|t| types.contains(*t))
            .map(|t| {
                let count = sum_totals(&combine_across_years(payload, &[t.clone()], years)).count;
                SummaryCard {
                    label: payload.type_label(t),
                    value: count.to_string(),
                    type_id: Some(t.clone()),
                    accent: Some(payload.type_accent(t)),
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    Summary {
        totals,
        active_days,
        cards,
        type_cards,
    }
}

// ─── tests ───────────────────────────────────────────────────────────────
