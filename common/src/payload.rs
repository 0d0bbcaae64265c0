//! The JSON document the heatmaps are rendered from.
//!
//! The payload is produced by the sync pipeline, loaded once and treated as
//! read-only afterwards. Optional fields are tolerated and replaced by
//! defaults: `units` falls back to miles/feet, missing `type_meta` entries
//! get a humanised label and a hashed accent colour.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::heat::{fallback_accent, Rgb};

/// Per-day aggregates of one type within one year, keyed by `YYYY-MM-DD`.
pub type DayMap = BTreeMap<String, DailyAggregate>;

/// Errors raised while loading a payload. Nothing renders without one.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("cannot read payload {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed payload JSON")]
    Parse(#[from] serde_json::Error),
}

// ─── Lenient numbers ─────────────────────────────────────────────────────────
//
// One malformed field must not fail the whole document. Non-numeric values
// read as absent; the record is then zero-valued or skipped from bucketing.

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::Null => None,
        other => {
            debug!("Ignoring non-numeric payload value {other}");
            None
        }
    })
}

fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(lenient_number(d)?.unwrap_or(0.0))
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(lenient_number(d)?
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map_or(0, |v| v as u64))
}

fn lenient_year<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Ok(lenient_number(d)?
        .filter(|v| v.fract() == 0.0 && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(v))
        .map(|v| v as i32))
}

// ─── Daily aggregate ─────────────────────────────────────────────────────────

/// Totals for one date. Combined (multi-type) aggregates also carry the set
/// of types that contributed a non-zero count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub distance: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub moving_time: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub elevation_gain: f64,
    #[serde(default)]
    pub activity_ids: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<BTreeSet<String>>,
}

// ─── Activity ────────────────────────────────────────────────────────────────

/// The minimal raw activity record used for time-of-day statistics.
/// Records with a missing or malformed `year` or `hour` are kept but never
/// bucketed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub hour: Option<f64>,
}

impl Activity {
    /// Hour of day as a bucket index, or `None` when missing, non-finite,
    /// fractional or outside `0..=23`.
    pub fn hour_bucket(&self) -> Option<usize> {
        let h = self.hour?;
        if !h.is_finite() || h.fract() != 0.0 || !(0.0..=23.0).contains(&h) {
            return None;
        }
        Some(h as usize)
    }
}

// ─── Units ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DistanceUnit {
    Km,
    #[default]
    Mi,
}

impl From<String> for DistanceUnit {
    fn from(s: String) -> Self {
        match s.as_str() {
            "km" => Self::Km,
            "mi" => Self::Mi,
            other => {
                warn!("Unknown distance unit {other:?}, using miles");
                Self::Mi
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ElevationUnit {
    M,
    #[default]
    Ft,
}

impl From<String> for ElevationUnit {
    fn from(s: String) -> Self {
        match s.as_str() {
            "m" => Self::M,
            "ft" => Self::Ft,
            other => {
                warn!("Unknown elevation unit {other:?}, using feet");
                Self::Ft
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Units {
    #[serde(default)]
    pub distance: DistanceUnit,
    #[serde(default)]
    pub elevation: ElevationUnit,
}

// ─── Type metadata ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeMeta {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
}

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub years: Vec<i32>,
    /// year → type → date → aggregate
    #[serde(default)]
    pub aggregates: BTreeMap<i32, BTreeMap<String, DayMap>>,
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub type_meta: BTreeMap<String, TypeMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl Payload {
    /// Parse and normalise a payload document.
    pub fn from_json(text: &str) -> Result<Self, PayloadError> {
        let mut payload: Payload = serde_json::from_str(text)?;
        payload.normalize();
        Ok(payload)
    }

    /// Read a payload from disk.
    pub fn load(path: &Path) -> Result<Self, PayloadError> {
        let text = std::fs::read_to_string(path).map_err(|source| PayloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let payload = Self::from_json(&text)?;
        info!(
            "Loaded payload from {} ({} types, {} years, {} activities)",
            path.display(),
            payload.types.len(),
            payload.years.len(),
            payload.activities.as_ref().map_or(0, Vec::len),
        );
        Ok(payload)
    }

    /// Drop duplicate type ids, sort and dedupe years, report bad accents.
    fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.types.retain(|t| {
            let fresh = seen.insert(t.clone());
            if !fresh {
                warn!("Duplicate activity type {t:?} in payload, ignoring");
            }
            fresh
        });

        self.years.sort_unstable();
        self.years.dedup();

        for (id, meta) in &self.type_meta {
            if let Some(accent) = &meta.accent {
                if Rgb::parse_hex(accent).is_none() {
                    warn!("Unparseable accent {accent:?} for type {id:?}, using fallback");
                }
            }
        }
    }

    /// Year domain, newest first.
    pub fn years_desc(&self) -> Vec<i32> {
        self.years.iter().rev().copied().collect()
    }

    /// Daily aggregates of one type within one year.
    pub fn day_map(&self, year: i32, type_id: &str) -> Option<&DayMap> {
        self.aggregates.get(&year)?.get(type_id)
    }

    /// Total activity count of `year` across `types`.
    pub fn year_count(&self, year: i32, types: &[String]) -> u64 {
        types
            .iter()
            .filter_map(|t| self.day_map(year, t))
            .flat_map(|days| days.values())
            .map(|a| a.count)
            .sum()
    }

    /// Display label for a type.
    pub fn type_label(&self, type_id: &str) -> String {
        self.type_meta
            .get(type_id)
            .and_then(|m| m.label.clone())
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| humanize_type_id(type_id))
    }

    /// Accent colour for a type.
    pub fn type_accent(&self, type_id: &str) -> Rgb {
        self.type_meta
            .get(type_id)
            .and_then(|m| m.accent.as_deref())
            .and_then(Rgb::parse_hex)
            .unwrap_or_else(|| fallback_accent(type_id))
    }

    /// Whether any raw activity carries a usable hour of day.
    pub fn has_hour_data(&self) -> bool {
        self.activities
            .as_ref()
            .is_some_and(|list| list.iter().any(|a| a.hour_bucket().is_some()))
    }
}

/// `"trail_run"` → `"Trail Run"`, `"WeightTraining"` → `"Weight Training"`.
pub fn humanize_type_id(id: &str) -> String {
    let mut spaced = String::with_capacity(id.len() + 4);
    let mut prev: Option<char> = None;
    for c in id.chars() {
        if c == '_' || c == '-' {
            spaced.push(' ');
        } else {
            if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                spaced.push(' ');
            }
            spaced.push(c);
        }
        prev = Some(c);
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── tests ───────────────────────────────────────────────────────────────
