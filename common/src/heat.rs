//! Heat mapping: scalar counts to colours.
//!
//! Two variants exist. [`heat_color`] is continuous and drives the frequency
//! matrices; [`discrete_level`] buckets a calendar cell into one of the five
//! [`LEVEL_COLORS`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Sub-linear gamma applied to `value / max` so that small counts stay
/// visibly distinct from zero.
pub const HEAT_GAMMA: f64 = 0.75;

/// Five-band palette for the discrete calendar variant, lightest first.
/// The SVG export paints with it.
pub const LEVEL_COLORS: [&str; 5] = ["#ebedf0", "#c6e48b", "#7bc96f", "#239a3b", "#196127"];

/// Fallback accents for types without `type_meta`, indexed by the id hash.
pub const FALLBACK_ACCENTS: [Rgb; 8] = [
    Rgb::new(0x38, 0xbd, 0xf8),
    Rgb::new(0xf9, 0x73, 0x16),
    Rgb::new(0x22, 0xc5, 0x5e),
    Rgb::new(0xe1, 0x1d, 0x48),
    Rgb::new(0xa8, 0x55, 0xf7),
    Rgb::new(0xea, 0xb3, 0x08),
    Rgb::new(0x14, 0xb8, 0xa6),
    Rgb::new(0xec, 0x48, 0x99),
];

// ─── Rgb ─────────────────────────────────────────────────────────────────────

/// An opaque 8-bit RGB colour. Serialises as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            6 => Some(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            3 => {
                let short = |i: usize| channel(i..i + 1).map(|v| v * 17);
                Some(Rgb::new(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Per-channel linear interpolation from `self` (t = 0) to `other` (t = 1).
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

// ─── Palette ─────────────────────────────────────────────────────────────────

/// Theme colours the engine needs to make decisions. Everything else about
/// the look of the page belongs to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// No data at all (max ≤ 0, or a calendar day without activity).
    pub empty: Rgb,
    /// Data exists but this bucket is zero.
    pub zero: Rgb,
    /// Dark end of the heat ramp.
    pub dark_base: Rgb,
    /// Calendar days where more than one type contributed.
    pub multi_type: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            empty: Rgb::new(0x16, 0x1b, 0x22),
            zero: Rgb::new(0x16, 0x1b, 0x22),
            dark_base: Rgb::new(0x16, 0x1b, 0x22),
            multi_type: Rgb::new(0xf4, 0xf1, 0xde),
        }
    }
}

// ─── mapping ─────────────────────────────────────────────────────────────────

/// `(value / max) ^ HEAT_GAMMA`, clamped to `[0, 1]`. Zero when either side
/// is non-positive.
pub fn heat_intensity(value: f64, max: f64) -> f64 {
    if max <= 0.0 || value <= 0.0 || !value.is_finite() || !max.is_finite() {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0).powf(HEAT_GAMMA)
}

/// Continuous heat colour for matrix buckets.
pub fn heat_color(base: Rgb, value: f64, max: f64, palette: &Palette) -> Rgb {
    if max <= 0.0 {
        return palette.empty;
    }
    if value <= 0.0 {
        return palette.zero;
    }
    palette.dark_base.lerp(base, heat_intensity(value, max))
}

/// Discrete 0..=4 level for calendar cells.
pub fn discrete_level(count: u64, max_count: u64) -> u8 {
    if count == 0 || max_count == 0 {
        return 0;
    }
    if max_count == 1 {
        return 1;
    }
    let ratio = count as f64 / max_count as f64;
    ((ratio * 3.0).floor() as u64 + 1).min(4) as u8
}

/// Deterministic accent for a type id: `Σ (i + 1) · code(i)` over the id's
/// UTF-16 code units, modulo the fallback palette.
pub fn fallback_accent(type_id: &str) -> Rgb {
    let hash = type_id
        .encode_utf16()
        .enumerate()
        .fold(0u64, |acc, (i, c)| acc.wrapping_add((i as u64 + 1).wrapping_mul(u64::from(c))));
    FALLBACK_ACCENTS[(hash % FALLBACK_ACCENTS.len() as u64) as usize]
}

// ─── tests ───────────────────────────────────────────────────────────────
