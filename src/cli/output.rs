//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::application::services::{MergeSpan, RenderedView};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

const SEPARATOR: &str = "  ";

/// Header line with each span's label at its first column, blank elsewhere.
fn span_line(view: &RenderedView, spans: &[MergeSpan]) -> Vec<String> {
    let mut line = vec![String::new(); view.width()];
    for span in spans {
        if let Some(slot) = line.get_mut(span.start) {
            *slot = span.label.clone();
        }
    }
    line
}

fn paint(cell: &str, width: usize) -> String {
    let padded = format!("{:<width$}", cell);
    if cell.contains("(+") {
        padded.green().to_string()
    } else if cell.contains("(-") {
        padded.red().to_string()
    } else {
        padded
    }
}

/// Lay a rendered view out as an aligned text table.
///
/// Three header lines (solution, product, tier) over the matrix columns; the
/// fixed column names sit on the tier line. Link-wrapped names print plain.
pub fn table(view: &RenderedView) -> Vec<String> {
    let solution_line = span_line(view, &view.solution_spans);
    let product_line = span_line(view, &view.product_spans);
    let tier_line: Vec<String> = view
        .fixed_columns
        .iter()
        .chain(&view.headers.tiers)
        .cloned()
        .collect();

    let body: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            [
                row.partner_id.clone(),
                row.plain_name.clone(),
                row.total.clone(),
                row.region.clone(),
                row.country.clone(),
            ]
            .into_iter()
            .chain(row.cells.iter().cloned())
            .collect()
        })
        .collect();

    let mut widths = vec![0; view.width()];
    for line in [&solution_line, &product_line, &tier_line]
        .into_iter()
        .chain(body.iter())
    {
        for (w, cell) in widths.iter_mut().zip(line) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(body.len() + 3);
    for line in [&solution_line, &product_line, &tier_line] {
        let text = line
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        lines.push(text.trim_end().cyan().bold().to_string());
    }
    for row in &body {
        let text = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| paint(cell, *w))
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        lines.push(text.trim_end().to_string());
    }
    lines
}
