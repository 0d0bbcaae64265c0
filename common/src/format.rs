//! Human-readable formatting of distances, elevations and durations.
//!
//! The conversion constants are fixed so that output matches the published
//! heatmaps exactly.

use crate::payload::{DistanceUnit, ElevationUnit};

pub const METERS_PER_KM: f64 = 1000.0;
pub const METERS_PER_MILE: f64 = 1609.344;
pub const FEET_PER_METER: f64 = 3.28084;

/// Meters → `"12.3 km"` / `"7.6 mi"`.
pub fn format_distance(meters: f64, unit: DistanceUnit) -> String {
    match unit {
        DistanceUnit::Km => format!("{:.1} km", meters / METERS_PER_KM),
        DistanceUnit::Mi => format!("{:.1} mi", meters / METERS_PER_MILE),
    }
}

/// Meters → `"152 m"` / `"499 ft"`.
pub fn format_elevation(meters: f64, unit: ElevationUnit) -> String {
    match unit {
        ElevationUnit::M => format!("{} m", meters.round() as i64),
        ElevationUnit::Ft => format!("{} ft", (meters * FEET_PER_METER).round() as i64),
    }
}

/// Seconds → `"1h 5m"` or `"45m"`. Rounds to whole minutes first.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds.max(0.0) / 60.0).round() as u64;
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

/// `"1 activity"`, `"2 activities"`.
pub fn pluralize(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

pub fn activities(count: u64) -> String {
    pluralize(count, "activity", "activities")
}

// ─── tests ───────────────────────────────────────────────────────────────
