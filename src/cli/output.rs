// Output formatting and display for CLI

use crate::config::LoggerConfig;
use colored::*;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Row for the generation status table
#[derive(Tabled)]
struct GenerationRow {
    #[tabled(rename = "Generation")]
    role: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Size")]
    size: String,
}

/// Print a success message to stdout
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print both generation files with their sizes against the per-generation quota
pub fn print_status(config: &LoggerConfig, rows: &[(&'static str, PathBuf, Option<u64>)]) {
    let quota = config.quota_per_generation();

    let rows: Vec<GenerationRow> = rows
        .iter()
        .map(|(role, path, size)| GenerationRow {
            role: role.to_string(),
            path: path.display().to_string(),
            size: match size {
                Some(size) => format!("{} / {}", format_bytes(*size), format_bytes(quota)),
                None => "missing".yellow().to_string(),
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("{}", table);
}

/// Render a byte count with the largest binary unit that keeps it at least 1
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
