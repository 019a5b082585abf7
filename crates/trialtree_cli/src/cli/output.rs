//! Output formatting for CLI commands
//!
//! Tables go through comfy-table with cyan headers; statuses and types get a
//! fixed colour each so a tree can be scanned at a glance.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use trialtree::{PathStatus, PathType};

/// A table cell with an optional foreground colour
pub type StyledCell = (String, Option<Color>);

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);
    table
}

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = new_table(headers);
    for row in rows {
        table.add_row(row);
    }
    println!("{}", table);
}

/// Print a table with per-cell colours
pub fn print_table_colored(headers: &[&str], rows: Vec<Vec<StyledCell>>) {
    let mut table = new_table(headers);
    for row in rows {
        let cells: Vec<Cell> = row
            .into_iter()
            .map(|(text, color)| match color {
                Some(c) => Cell::new(text).fg(c),
                None => Cell::new(text),
            })
            .collect();
        table.add_row(cells);
    }
    println!("{}", table);
}

/// Pretty-print any serializable value as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn status_color(status: PathStatus) -> Color {
    match status {
        PathStatus::Done => Color::Green,
        PathStatus::Error => Color::Red,
        PathStatus::Processing | PathStatus::Slurm => Color::Yellow,
        PathStatus::WaitingForServer => Color::Blue,
        PathStatus::ReadyToProcess => Color::Magenta,
        PathStatus::NeedsData => Color::DarkYellow,
        PathStatus::Loading => Color::Grey,
    }
}

pub fn type_color(path_type: PathType) -> Color {
    match path_type {
        PathType::Dataset => Color::Cyan,
        PathType::Subject => Color::Green,
        PathType::Trial | PathType::TrialSegment => Color::White,
        PathType::TrialsFolder => Color::DarkCyan,
        PathType::NotFound | PathType::Loading => Color::Grey,
    }
}

pub fn status_cell(status: PathStatus) -> StyledCell {
    (status.to_string(), Some(status_color(status)))
}

pub fn type_cell(path_type: PathType) -> StyledCell {
    (path_type.to_string(), Some(type_color(path_type)))
}

pub fn plain(text: impl Into<String>) -> StyledCell {
    (text.into(), None)
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "-"
    }
}

/// Fixed-precision float, or `-` when absent
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

/// Shown for the store root, whose logical path is empty
pub fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}
