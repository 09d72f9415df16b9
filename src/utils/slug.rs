//! URL slugification and name utilities.
//!
//! Converts file and directory names to URL path segments, heading text to
//! fragment ids, and splits `01-` style ordering prefixes off names.

use crate::config::SlugMode;
use regex::Regex;
use std::sync::LazyLock;

/// Characters forbidden in URL path segments
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '{', '}', '%', '"', '\'', '`',
    '&', '+', '=', ',', ';', '!', '@', '$', '^', '~', '\t', '\r', '\n',
];

/// `01-intro`, `2_basics`, `10. closures`
static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[-_.\s]+(.+)$").expect("valid number prefix regex"));

// ============================================================================
// Slugification
// ============================================================================

/// Convert one path segment (file stem or directory name) for use in a URL.
pub fn slugify_segment(text: &str, mode: SlugMode) -> String {
    match mode {
        SlugMode::Safe => sanitize_text(text),
        SlugMode::On => ascii_slug(text),
        SlugMode::No => text.to_owned(),
    }
}

/// Convert heading text to a fragment id.
///
/// Lowercases, keeps letters and digits of any script, joins words with `-`.
pub fn slugify_fragment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    out
}

/// Remove forbidden characters and replace whitespace with `-`
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Transliterate to ASCII, lowercase, and join alphanumeric runs with `-`
fn ascii_slug(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_ascii_lowercase();
    ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// Number Prefixes
// ============================================================================

/// Split a leading ordering number off a name.
///
/// Returns the number (if any) and the remaining name. Names that are only a
/// number (`2023`) keep it as their name.
pub fn split_number_prefix(name: &str) -> (Option<i64>, &str) {
    match NUMBER_PREFIX.captures(name) {
        Some(caps) => {
            let number = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let rest = caps.get(2).map_or(name, |m| m.as_str());
            match number {
                Some(number) => (Some(number), rest),
                None => (None, name),
            }
        }
        None => (None, name),
    }
}
