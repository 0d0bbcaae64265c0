//! Configuration parsing – reads a `KEY=VALUE` file.
//!
//! ```text
//! # stride.conf
//! PAYLOAD_PATH=site/data.json
//! CALENDAR_WEEK_START=monday
//! STATS_WEEK_START=sunday
//! SHOW_ALL_YEARS=0
//! SVG_DIR=heatmaps
//! MULTI_TYPE_COLOR="#f4f1de"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::calendar::WeekStart;
use crate::heat::{Palette, Rgb};
use crate::render::ViewOptions;

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON document produced by the sync pipeline.
    pub payload_path: PathBuf,
    /// Where `svg` output lands, one subdirectory per scope.
    pub svg_dir: PathBuf,

    // ── view ─────────────────────────────────────────────────────────
    pub calendar_week_start: WeekStart,
    pub stats_week_start: WeekStart,
    pub show_all_years: bool,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            payload_path: PathBuf::from("site/data.json"),
            svg_dir: PathBuf::from("heatmaps"),
            calendar_week_start: WeekStart::Monday,
            stats_week_start: WeekStart::Sunday,
            show_all_years: false,
            palette: Palette::default(),
        }
    }
}

impl Config {
    /// Default config path.
    pub fn default_path() -> &'static str {
        "/etc/stride/stride.conf"
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            calendar_week_start: self.calendar_week_start,
            stats_week_start: self.stats_week_start,
            palette: self.palette,
        }
    }
}

/// Load `path`, or fall back to defaults when `path` is the default location
/// and nothing is there.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path == Path::new(Config::default_path()) && !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    load(path)
}

/// Parse a `KEY=VALUE` configuration file.
///
/// Lines starting with `#` are comments.  Values may be optionally
/// double-quoted.  Unknown keys are silently ignored.
pub fn load(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config: {}", path.display()))?;

    let config = from_map(&parse_conf(&text));
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn from_map(map: &HashMap<String, String>) -> Config {
    let defaults = Config::default();
    let get = |key: &str| -> Option<String> { map.get(key).cloned().filter(|v| !v.is_empty()) };
    let get_week = |key: &str, default: WeekStart| -> WeekStart {
        match get(key) {
            Some(v) => WeekStart::parse(&v).unwrap_or_else(|| {
                warn!("{key}={v} is not monday/sunday, using {default:?}");
                default
            }),
            None => default,
        }
    };
    let get_color = |key: &str, default: Rgb| -> Rgb {
        match get(key) {
            Some(v) => Rgb::parse_hex(&v).unwrap_or_else(|| {
                warn!("{key}={v} is not a hex colour, using {default}");
                default
            }),
            None => default,
        }
    };

    let empty = get_color("EMPTY_COLOR", defaults.palette.empty);
    let palette = Palette {
        empty,
        zero: empty,
        dark_base: empty,
        multi_type: get_color("MULTI_TYPE_COLOR", defaults.palette.multi_type),
    };

    Config {
        payload_path: get("PAYLOAD_PATH").map(PathBuf::from).unwrap_or(defaults.payload_path),
        svg_dir: get("SVG_DIR").map(PathBuf::from).unwrap_or(defaults.svg_dir),
        calendar_week_start: get_week("CALENDAR_WEEK_START", defaults.calendar_week_start),
        stats_week_start: get_week("STATS_WEEK_START", defaults.stats_week_start),
        show_all_years: get("SHOW_ALL_YEARS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.show_all_years),
        palette,
    }
}

/// Parse `KEY=VALUE` lines into a map, stripping optional double-quotes.
fn parse_conf(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, val)) = line.split_once('=') {
            let key = key.trim();
            let val = val.trim().trim_matches('"');
            map.insert(key.to_string(), val.to_string());
        }
    }
    map
}

// ─── tests ───────────────────────────────────────────────────────────────
