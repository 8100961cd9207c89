//! Markdown dashboard rendering.
//!
//! This module renders a computed `Dashboard` as a Markdown document: the
//! command-line counterpart of the browser dashboard.

use crate::analysis::{Dashboard, Heatmap, ListRow, MemberRow, MonthPoint, SeriesMode, Trend};
use crate::models::BoardSnapshot;

/// Number of list rows shown before the rest are folded away.
const VISIBLE_LIST_ROWS: usize = 12;

/// Width of the inline bar, in characters.
const BAR_WIDTH: usize = 20;

/// Header branding for the report.
#[derive(Debug, Clone, Default)]
pub struct ReportHeader {
    pub title: String,
    pub board_url: Option<String>,
    pub logo_url: Option<String>,
    pub logo_size: u32,
    pub logo_max_width: u32,
}

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report(
    header: &ReportHeader,
    snapshot: &BoardSnapshot,
    dashboard: &Dashboard,
) -> String {
    let mut output = String::new();

    output.push_str(&generate_title(header));
    output.push_str(&generate_metadata_section(header, dashboard));
    output.push_str(&generate_kpi_section(dashboard));
    output.push_str(&generate_list_section(&dashboard.lists));
    output.push_str(&generate_owner_section(&dashboard.members));
    output.push_str(&generate_heatmap_section(snapshot, &dashboard.heatmap));
    output.push_str(&generate_monthly_section(&dashboard.monthly, dashboard.series_mode));
    output.push_str(&generate_trend_section(&dashboard.trend));
    output.push_str(&generate_footer());

    output
}

fn generate_title(header: &ReportHeader) -> String {
    let mut section = String::new();

    if let Some(ref logo) = header.logo_url {
        section.push_str(&format!(
            "<img src=\"{}\" alt=\"Logo\" height=\"{}\" style=\"max-width: {}px\" />\n\n",
            logo, header.logo_size, header.logo_max_width
        ));
    }
    section.push_str(&format!("# {}\n\n", header.title));

    section
}

/// Generate the metadata section.
fn generate_metadata_section(header: &ReportHeader, dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if let Some(ref url) = header.board_url {
        section.push_str(&format!("- **Board:** {}\n", url));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Matching Cards:** {}\n", dashboard.matched_cards));
    if dashboard.active_filters > 0 {
        section.push_str(&format!("- **Active Filters:** {}\n", dashboard.active_filters));
    }
    section.push('\n');

    section
}

fn generate_kpi_section(dashboard: &Dashboard) -> String {
    let k = &dashboard.kpis;
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| Cards | Unassigned | Lists | Members |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        k.total_cards, k.unassigned_cards, k.lists, k.members
    ));

    section
}

/// Generate the per-list ranking.
fn generate_list_section(rows: &[ListRow]) -> String {
    let mut section = String::new();

    section.push_str("## Cards by List\n\n");
    if rows.is_empty() {
        section.push_str("No open lists.\n\n");
        return section;
    }

    let max = rows.first().map(|r| r.count).unwrap_or(0);
    section.push_str("| List | Cards | |\n");
    section.push_str("|:---|:---:|:---|\n");
    for row in rows.iter().take(VISIBLE_LIST_ROWS) {
        section.push_str(&format!(
            "| {} | {} | `{}` |\n",
            cell(&row.name),
            row.count,
            bar(row.count, max)
        ));
    }

    if rows.len() > VISIBLE_LIST_ROWS {
        section.push_str(&format!(
            "\n<details>\n<summary>{} more lists</summary>\n\n",
            rows.len() - VISIBLE_LIST_ROWS
        ));
        for row in &rows[VISIBLE_LIST_ROWS..] {
            section.push_str(&format!("- {}: {}\n", row.name, row.count));
        }
        section.push_str("</details>\n");
    }
    section.push('\n');

    section
}

/// Generate the per-owner ranking.
fn generate_owner_section(rows: &[MemberRow]) -> String {
    let mut section = String::new();

    section.push_str("## Cards by Owner\n\n");
    if rows.is_empty() {
        section.push_str("No matching cards.\n\n");
        return section;
    }

    let max = rows.first().map(|r| r.count).unwrap_or(0);
    section.push_str("| | Owner | Cards | |\n");
    section.push_str("|:---:|:---|:---:|:---|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            cell(&row.initials),
            cell(&row.name),
            row.count,
            bar(row.count, max)
        ));
    }
    section.push('\n');

    section
}

/// Generate the list × owner matrix.
fn generate_heatmap_section(snapshot: &BoardSnapshot, heatmap: &Heatmap) -> String {
    let mut section = String::new();

    section.push_str("## Heatmap\n\n");
    if heatmap.lists.is_empty() || heatmap.members.is_empty() {
        section.push_str("Not enough data.\n\n");
        return section;
    }

    let owners: Vec<String> = heatmap
        .members
        .iter()
        .map(|key| cell(&snapshot.member_key_name(key)))
        .collect();

    section.push_str(&format!("| List | {} |\n", owners.join(" | ")));
    section.push_str(&format!("|:---|{}\n", ":---:|".repeat(owners.len())));
    for (i, list_id) in heatmap.lists.iter().enumerate() {
        let cells: Vec<String> = heatmap.cells[i].iter().map(|c| c.to_string()).collect();
        section.push_str(&format!(
            "| {} | {} |\n",
            cell(snapshot.list_name(list_id)),
            cells.join(" | ")
        ));
    }
    section.push('\n');

    section
}

fn generate_monthly_section(points: &[MonthPoint], mode: SeriesMode) -> String {
    let mut section = String::new();

    let heading = match mode {
        SeriesMode::Monthly => "## Activity by Month\n\n",
        SeriesMode::Cumulative => "## Cumulative Activity by Month\n\n",
    };
    section.push_str(heading);
    if points.is_empty() {
        section.push_str("No activity recorded.\n\n");
        return section;
    }

    section.push_str("| Month | Cards |\n");
    section.push_str("|:---|:---:|\n");
    for point in points {
        section.push_str(&format!("| {} | {} |\n", point.month, point.value));
    }
    section.push('\n');

    section
}

fn generate_trend_section(trend: &Trend) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Daily Activity ({} days)\n\n", trend.days.len()));
    if trend.series.is_empty() {
        section.push_str("No activity recorded.\n\n");
        return section;
    }

    let names: Vec<String> = trend.series.iter().map(|s| cell(&s.name)).collect();
    section.push_str(&format!("| Day | {} |\n", names.join(" | ")));
    section.push_str(&format!("|:---|{}\n", ":---:|".repeat(names.len())));
    for (i, day) in trend.days.iter().enumerate() {
        let values: Vec<String> = trend
            .series
            .iter()
            .map(|s| s.points.get(i).copied().unwrap_or(0).to_string())
            .collect();
        section.push_str(&format!("| {} | {} |\n", day.format("%Y-%m-%d"), values.join(" | ")));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by trello-reports*\n".to_string()
}

/// Make text safe inside a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// A proportional bar, empty when `max` is zero.
fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (count * BAR_WIDTH + max / 2) / max;
    "█".repeat(filled)
}
