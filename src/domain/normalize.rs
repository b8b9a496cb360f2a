//! Normalization of roster and source values
//!
//! Every comparison between the roster and the score source goes through these
//! functions, so domain and name matching use one definition of equality.

/// Characters that leak into spreadsheet exports: C0/C1 controls and zero-width space.
fn is_noise(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}' | '\u{200B}')
}

/// Remove control characters and zero-width spaces.
pub fn strip_control_chars(raw: &str) -> String {
    raw.chars().filter(|c| !is_noise(*c)).collect()
}

/// Normalize an email domain for matching.
///
/// Lowercases, trims, strips control characters and a leading `@`.
/// Returns `None` when nothing is left.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let cleaned = strip_control_chars(raw).trim().to_lowercase();
    let cleaned = cleaned.strip_prefix('@').unwrap_or(&cleaned).trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Normalize a display name: control characters stripped, whitespace trimmed.
pub fn normalize_name(raw: &str) -> String {
    strip_control_chars(raw).trim().to_string()
}

/// Key used for case-insensitive name matching.
pub fn name_key(raw: &str) -> String {
    normalize_name(raw).to_lowercase()
}

/// Coerce a roster cell into a boolean flag.
///
/// This is the only place where boolean cells are interpreted.
pub fn coerce_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "x"
    )
}

/// Deterministic id for a roster partner that has no match in the score source.
pub fn placeholder_id(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, normalize_name(name).replace(' ', "_"))
}
