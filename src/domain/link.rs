//! Spreadsheet-style link cells: `=HYPERLINK("url", "name")`

use std::sync::OnceLock;

use regex::Regex;

const HYPERLINK_PATTERN: &str =
    r#"(?i)^\s*=\s*HYPERLINK\(\s*"((?:[^"]|"")*)"\s*[,;]\s*"((?:[^"]|"")*)"\s*\)\s*$"#;

fn captures(cell: &str) -> Option<regex::Captures<'_>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HYPERLINK_PATTERN).expect("valid hyperlink pattern"))
        .captures(cell)
}

fn quote(raw: &str) -> String {
    raw.replace('"', "\"\"")
}

fn unquote(raw: &str) -> String {
    raw.replace("\"\"", "\"")
}

/// Wrap a display name into a link cell.
pub fn hyperlink(url: &str, name: &str) -> String {
    format!("=HYPERLINK(\"{}\", \"{}\")", quote(url), quote(name))
}

/// Plain display text of a cell: the link label of a link cell, otherwise the cell itself.
pub fn plain_text(cell: &str) -> String {
    match captures(cell) {
        Some(caps) => unquote(&caps[2]),
        None => cell.to_string(),
    }
}
