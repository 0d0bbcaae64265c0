//! Static SVG export of calendar grids.
//!
//! Produces the standalone heatmap images embedded in READMEs: one `<rect>`
//! per day painted with its discrete level colour, the tooltip as a native
//! `<title>`. [`write_all`] renders every type and year in one pass and
//! [`update_readme`] keeps the README's image section in step with it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::aggregate::{combine_across_years, sum_totals};
use crate::calendar::WeekStart;
use crate::grid::{build_calendar, CalendarCell, CalendarGrid, GridScope};
use crate::heat::{Palette, LEVEL_COLORS};
use crate::payload::{DayMap, Payload};

pub const CELL: u32 = 12;
pub const GAP: u32 = 2;
pub const PADDING: u32 = 16;

pub const README_START: &str = "<!-- HEATMAPS:START -->";
pub const README_END: &str = "<!-- HEATMAPS:END -->";

const BACKGROUND: &str = "#ffffff";

/// Escape text for use inside SVG elements and attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `grid` as an SVG document.
pub fn render(grid: &CalendarGrid) -> String {
    let width = grid.weeks * (CELL + GAP) + PADDING * 2;
    let height = 7 * (CELL + GAP) + PADDING * 2;

    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        ),
        format!(r#"<rect width="{width}" height="{height}" fill="{BACKGROUND}"/>"#),
        format!(r#"<g transform="translate({PADDING},{PADDING})">"#),
    ];
    lines.extend(grid.cells.iter().map(cell_rect));
    lines.push("</g>".to_string());
    lines.push("</svg>".to_string());

    let mut svg = lines.join("\n");
    svg.push('\n');
    svg
}

fn cell_rect(cell: &CalendarCell) -> String {
    let x = cell.week * (CELL + GAP);
    let y = cell.row * (CELL + GAP);
    let fill = if cell.outside {
        BACKGROUND
    } else {
        LEVEL_COLORS[usize::from(cell.level).min(LEVEL_COLORS.len() - 1)]
    };
    let rect = format!(
        r#"<rect x="{x}" y="{y}" width="{CELL}" height="{CELL}" fill="{fill}" stroke="{BACKGROUND}" stroke-width="1""#
    );
    match (&cell.tooltip, cell.outside) {
        (Some(title), false) => format!(
            r#"{rect} data-date="{}"><title>{}</title></rect>"#,
            cell.date,
            escape(title)
        ),
        _ => format!("{rect}/>"),
    }
}

/// Write `grid` to `<dir>/<scope>/<year>.svg` and return the path.
pub fn write(grid: &CalendarGrid, dir: &Path) -> Result<PathBuf> {
    let scope_dir = dir.join(grid.scope.slug());
    std::fs::create_dir_all(&scope_dir)
        .with_context(|| format!("Cannot create {}", scope_dir.display()))?;
    let path = scope_dir.join(format!("{}.svg", grid.year));
    std::fs::write(&path, render(grid))
        .with_context(|| format!("Cannot write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(path)
}

/// Write one grid per payload type and year, regardless of any filter.
pub fn write_all(
    payload: &Payload,
    dir: &Path,
    week_start: WeekStart,
    palette: &Palette,
) -> Result<Vec<PathBuf>> {
    let years = payload.years_desc();
    let empty = DayMap::new();
    let mut written = Vec::with_capacity(payload.types.len() * years.len());

    for type_id in &payload.types {
        let scope = GridScope::Single(type_id.clone());
        let show_distance =
            sum_totals(&combine_across_years(payload, std::slice::from_ref(type_id), &years))
                .reports_distance();
        for &year in &years {
            let days = payload.day_map(year, type_id).unwrap_or(&empty);
            let Some(grid) =
                build_calendar(payload, year, &scope, days, week_start, palette, show_distance)
            else {
                warn!("Year {year} cannot be laid out, skipping");
                continue;
            };
            written.push(write(&grid, dir)?);
        }
    }
    Ok(written)
}

/// Markdown linking every image [`write_all`] produces, one heading per type.
pub fn readme_section(types: &[String], years_desc: &[i32], dir: &Path) -> String {
    let mut lines = vec!["## Heatmaps".to_string(), String::new()];
    for type_id in types {
        lines.push(format!("### {type_id}"));
        lines.push(String::new());
        for year in years_desc {
            let path = dir.join(type_id).join(format!("{year}.svg"));
            lines.push(format!("![{type_id} {year}]({})", path.display()));
        }
        lines.push(String::new());
    }
    format!("{}\n", lines.join("\n").trim_end())
}

/// Replace the text between the heatmap markers, or append a marked
/// section when either marker is missing.
pub fn splice_readme(content: &str, section: &str) -> String {
    if let Some((before, rest)) = content.split_once(README_START) {
        if let Some((_, after)) = rest.split_once(README_END) {
            return format!("{before}{README_START}\n{section}{README_END}{after}");
        }
    }
    format!("{}\n\n{README_START}\n{section}{README_END}\n", content.trim_end())
}

/// Rewrite the heatmap section of the README at `path`. A missing README is
/// left alone and reported as `false`.
pub fn update_readme(path: &Path, section: &str) -> Result<bool> {
    if !path.exists() {
        info!("No README at {}, skipping section update", path.display());
        return Ok(false);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    std::fs::write(path, splice_readme(&content, section))
        .with_context(|| format!("Cannot write {}", path.display()))?;
    info!("Updated heatmap section in {}", path.display());
    Ok(true)
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        Payload::from_json(
            r##"{"types": ["run", "lift"], "years": [2023, 2024],
                "aggregates": {"2024": {
                    "run": {"2024-03-15": {"count": 2}, "2024-03-16": {"count": 1}},
                    "lift": {"2024-03-17": {"count": 1, "moving_time": 1800}}
                }},
                "type_meta": {"run": {"label": "Run & Jog", "accent": "#fc4c02"}}}"##,
        )
        .unwrap()
    }

    fn grid() -> CalendarGrid {
        let p = payload();
        let days = p.day_map(2024, "run").unwrap().clone();
        build_calendar(
            &p,
            2024,
            &GridScope::Single("run".into()),
            &days,
            WeekStart::Monday,
            &Palette::default(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b & "c">"#), "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn test_render_layout() {
        let g = grid();
        let svg = render(&g);
        let width = g.weeks * 14 + 32;
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(&format!(r#"width="{width}" height="130""#)));
        assert_eq!(svg.matches("<rect x=").count(), g.cells.len());
        assert_eq!(svg.matches("<title>").count(), 366);
        assert!(svg.ends_with("</g>\n</svg>\n"));
    }

    #[test]
    fn test_render_paints_levels() {
        let svg = render(&grid());
        assert!(svg.contains(
            r##"fill="#196127" stroke="#ffffff" stroke-width="1" data-date="2024-03-15"><title>2024-03-15"##
        ));
        assert!(svg.contains(r##"fill="#7bc96f" stroke="#ffffff" stroke-width="1" data-date="2024-03-16""##));
        assert!(svg.contains(r##"fill="#ebedf0" stroke="#ffffff" stroke-width="1" data-date="2024-06-01""##));
        assert!(!svg.contains("#fc4c02"));
    }

    #[test]
    fn test_write_creates_scope_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&grid(), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("run").join("2024.svg"));
        assert!(std::fs::read_to_string(path).unwrap().starts_with("<?xml"));
    }

    #[test]
    fn test_write_all_covers_every_type_and_year() {
        let dir = tempfile::tempdir().unwrap();
        let p = payload();
        let written = write_all(&p, dir.path(), WeekStart::Monday, &Palette::default()).unwrap();
        assert_eq!(written.len(), 4);
        for type_id in ["run", "lift"] {
            for year in [2023, 2024] {
                let path = dir.path().join(type_id).join(format!("{year}.svg"));
                assert!(written.contains(&path));
                assert!(path.is_file());
            }
        }
        let lift = std::fs::read_to_string(dir.path().join("lift").join("2024.svg")).unwrap();
        assert!(lift.contains("2024-03-17\n1 activity\nDuration: 30m"));
    }

    #[test]
    fn test_readme_section() {
        let section = readme_section(&["run".into(), "ride".into()], &[2024, 2023], Path::new("heatmaps"));
        assert_eq!(
            section,
            "## Heatmaps\n\n### run\n\n![run 2024](heatmaps/run/2024.svg)\n![run 2023](heatmaps/run/2023.svg)\n\n\
             ### ride\n\n![ride 2024](heatmaps/ride/2024.svg)\n![ride 2023](heatmaps/ride/2023.svg)\n"
        );
    }

    #[test]
    fn test_splice_replaces_between_markers() {
        let content = format!("# Me\n{README_START}\nstale\n{README_END}\nfooter\n");
        let spliced = splice_readme(&content, "fresh\n");
        assert_eq!(spliced, format!("# Me\n{README_START}\nfresh\n{README_END}\nfooter\n"));
    }

    #[test]
    fn test_splice_appends_without_markers() {
        let spliced = splice_readme("# Me\n\n", "fresh\n");
        assert_eq!(spliced, format!("# Me\n\n{README_START}\nfresh\n{README_END}\n"));
    }

    #[test]
    fn test_update_readme() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("README.md");
        assert!(!update_readme(&missing, "x\n").unwrap());
        assert!(!missing.exists());

        std::fs::write(&missing, "# Me\n").unwrap();
        assert!(update_readme(&missing, "x\n").unwrap());
        let content = std::fs::read_to_string(&missing).unwrap();
        assert_eq!(content, format!("# Me\n\n{README_START}\nx\n{README_END}\n"));

        assert!(update_readme(&missing, "y\n").unwrap());
        let content = std::fs::read_to_string(&missing).unwrap();
        assert_eq!(content, format!("# Me\n\n{README_START}\ny\n{README_END}\n"));
    }
}
