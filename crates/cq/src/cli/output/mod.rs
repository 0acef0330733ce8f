//! Rendering for CLI output.
//!
//! Styling and highlighting only apply when stdout is a terminal, so piped output stays plain.

mod highlight;

use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use cq_search::SearchResponse;
pub use highlight::Highlighter;
use indexmap::IndexMap;
use serde_json::Value;

/// ANSI color codes for terminal output.
mod colors {
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Cyan text (for headers).
    pub const CYAN: &str = "\x1b[36m";
    /// Yellow text (for warnings).
    pub const YELLOW: &str = "\x1b[33m";
    /// Dim/gray text (for less important info).
    pub const DIM: &str = "\x1b[2m";
    /// Reset all formatting.
    pub const RESET: &str = "\x1b[0m";
}

/// Returns whether stdout is a terminal.
fn styled() -> bool {
    io::stdout().is_terminal()
}

/// Wraps `text` in `codes` when styling is on.
fn paint(codes: &[&str], text: &str) -> String {
    if !styled() {
        return text.to_string();
    }
    format!("{}{text}{}", codes.concat(), colors::RESET)
}

/// Formats a header with bold cyan styling.
pub fn header(text: &str) -> String {
    paint(&[colors::BOLD, colors::CYAN], text)
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    paint(&[colors::BOLD], text)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    paint(&[colors::DIM], text)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    paint(&[colors::YELLOW], text)
}

/// Prints TOML, highlighted on a terminal.
pub fn print_toml(content: &str) {
    if styled() {
        print!("{}", Highlighter::new().highlight_toml(content));
    } else {
        print!("{content}");
    }
}

/// Prints a JSON value, pretty unless `compact`, highlighted on a terminal.
pub fn print_json(value: &Value, compact: bool) -> ExitCode {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            return ExitCode::FAILURE;
        }
    };
    if styled() && !compact {
        println!("{}", Highlighter::new().highlight_json(&rendered));
    } else {
        println!("{rendered}");
    }
    ExitCode::SUCCESS
}

/// Prints a normalized response as tables: hits, then one table per aggregation.
pub fn print_response(response: &SearchResponse) {
    let max_score = response
        .max_score
        .map_or_else(|| "-".to_string(), |score| format!("{score:.3}"));
    println!(
        "{} {}",
        header(&format!("{} hits", response.total)),
        dim(&format!("(max score {max_score})"))
    );

    if response.documents.is_empty() {
        println!("{}", dim("No documents returned."));
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["Id", "Score", "Matched", "Inner hits"]);
        for document in &response.documents {
            let score = document
                .score
                .map_or_else(|| "-".to_string(), |score| format!("{score:.3}"));
            let inner: usize = document.inner_hits.values().map(Vec::len).sum();
            table.add_row(vec![
                Cell::new(&document.id),
                Cell::new(score),
                Cell::new(document.matched_queries.join(", ")),
                Cell::new(inner.to_string()),
            ]);
        }
        println!("{table}");
    }

    for (name, buckets) in &response.aggregations {
        println!();
        println!("{}", subheader(name));
        print_buckets(buckets);
    }
}

/// Prints the buckets of one aggregation.
fn print_buckets(buckets: &IndexMap<String, u64>) {
    if buckets.is_empty() {
        println!("   {}", dim("(no buckets)"));
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Value", "Count"]);
    for (key, count) in buckets {
        table.add_row(vec![Cell::new(key), Cell::new(count.to_string())]);
    }
    println!("{table}");
}
