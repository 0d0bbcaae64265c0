//! Stride CLI – renders activity heatmaps from the synced payload.
//!
//! This binary:
//! 1. Reads configuration from `stride.conf` (flags override it)
//! 2. Loads the payload JSON; failure here is fatal
//! 3. Applies the type/year toggles given on the command line
//! 4. Emits the render model as JSON, writes one SVG per rendered year, or
//!    exports every type and year and refreshes the README's image section

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use stride_common::config::{self, Config};
use stride_common::{recompute, svg, FilterState, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Render model as JSON on stdout.
    Json,
    /// One SVG calendar per rendered year.
    Svg,
    /// One SVG calendar per payload type and year, ignoring the selection.
    SvgAll,
}

#[derive(Debug, Parser)]
#[command(name = "stride", version, about = "Render activity heatmaps")]
struct Args {
    /// Configuration file.
    #[arg(short, long, default_value = Config::default_path())]
    config: PathBuf,

    /// Payload JSON (overrides PAYLOAD_PATH).
    #[arg(short, long)]
    payload: Option<PathBuf>,

    /// Toggle an activity type into the selection. Repeatable; none means all.
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// Toggle a year into the selection. Repeatable; none means all visible.
    #[arg(short = 'y', long = "year", value_name = "YEAR")]
    years: Vec<i32>,

    /// Keep leading years without any activity.
    #[arg(long)]
    all_years: bool,

    #[arg(short, long, value_enum, default_value_t = Output::Json)]
    output: Output,

    /// Output directory for SVG files (overrides SVG_DIR).
    #[arg(long)]
    svg_dir: Option<PathBuf>,

    /// README whose heatmap section is rewritten by `--output svg-all`.
    #[arg(long, value_name = "PATH")]
    readme: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // ── load config ──────────────────────────────────────────────────
    let mut config = config::load_or_default(&args.config).context("Config load failed")?;
    if let Some(path) = &args.payload {
        config.payload_path = path.clone();
    }
    if let Some(dir) = &args.svg_dir {
        config.svg_dir = dir.clone();
    }
    if args.all_years {
        config.show_all_years = true;
    }

    // ── load payload ─────────────────────────────────────────────────
    let payload = Payload::load(&config.payload_path)
        .with_context(|| format!("Payload load failed: {}", config.payload_path.display()))?;

    // ── selection ────────────────────────────────────────────────────
    let state = build_selection(&payload, &config, &args);
    let model = recompute(&payload, &state, &config.view_options());
    info!(
        "Rendered {} year(s) for {} type(s): {} activities",
        model.years.len(),
        model.types.len(),
        model.summary.totals.count,
    );

    // ── output ───────────────────────────────────────────────────────
    match args.output {
        Output::Json => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&model)
            } else {
                serde_json::to_string(&model)
            }
            .context("Cannot serialise render model")?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("Cannot write to stdout")?;
        }
        Output::Svg => {
            for grid in &model.calendars {
                svg::write(grid, &config.svg_dir)?;
            }
        }
        Output::SvgAll => {
            let options = config.view_options();
            let written = svg::write_all(
                &payload,
                &config.svg_dir,
                options.calendar_week_start,
                &options.palette,
            )?;
            info!("Exported {} heatmap(s) to {}", written.len(), config.svg_dir.display());
            if let Some(readme) = &args.readme {
                let section =
                    svg::readme_section(&payload.types, &payload.years_desc(), &config.svg_dir);
                svg::update_readme(readme, &section)?;
            }
        }
    }

    Ok(())
}

/// Replay the command-line toggles onto a fresh filter state.
fn build_selection(payload: &Payload, config: &Config, args: &Args) -> FilterState {
    let mut state = FilterState::new(config.show_all_years);
    for type_id in &args.types {
        if !payload.types.contains(type_id) {
            warn!("Unknown activity type {type_id:?}, ignoring");
            continue;
        }
        if state.types.subset().is_some_and(|s| s.contains(type_id)) {
            continue;
        }
        state.toggle_type(payload, type_id);
    }

    let visible = state.visible_years(payload);
    for &year in &args.years {
        if !visible.contains(&year) {
            warn!("Year {year} has no visible data for this selection, ignoring");
            continue;
        }
        if state.years.subset().is_some_and(|s| s.contains(&year)) {
            continue;
        }
        state.toggle_year(year);
    }
    state
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        Payload::from_json(
            r#"{"types": ["run", "ride"], "years": [2023, 2024],
                "aggregates": {
                    "2023": {"run": {"2023-04-01": {"count": 1}}},
                    "2024": {"ride": {"2024-04-01": {"count": 1}}}
                }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_no_flags_selects_everything() {
        let args = Args::parse_from(["stride"]);
        let state = build_selection(&payload(), &Config::default(), &args);
        assert!(state.types.is_all());
        assert!(state.years.is_all());
    }

    #[test]
    fn test_flags_build_subsets() {
        let args = Args::parse_from(["stride", "-t", "ride", "-t", "ride", "-t", "swim", "-y", "2024"]);
        let p = payload();
        let state = build_selection(&p, &Config::default(), &args);
        assert_eq!(state.resolved_types(&p), vec!["ride"]);
        assert_eq!(state.resolved_years(&p), vec![2024]);
    }

    #[test]
    fn test_svg_all_with_readme() {
        let args = Args::parse_from(["stride", "-o", "svg-all", "--readme", "README.md"]);
        assert_eq!(args.output, Output::SvgAll);
        assert_eq!(args.readme, Some(PathBuf::from("README.md")));
        let args = Args::parse_from(["stride"]);
        assert_eq!(args.output, Output::Json);
        assert!(args.readme.is_none());
    }

    #[test]
    fn test_hidden_year_is_ignored() {
        let args = Args::parse_from(["stride", "--type", "ride", "--year", "2023"]);
        let p = payload();
        let state = build_selection(&p, &Config::default(), &args);
        assert!(state.years.is_all());
        assert_eq!(state.resolved_years(&p), vec![2024]);
    }
}
