use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::config::{DEFAULT_PLACEHOLDER_TOKENS, ExtractionConfig};

static DEFAULT_PLACEHOLDERS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| DEFAULT_PLACEHOLDER_TOKENS.iter().copied().collect());

/// Zero-width characters OCR leaves around glued text. `str::trim` keeps them.
const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Trim whitespace and zero-width characters from both ends.
pub fn trim_line(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || ZERO_WIDTH.contains(&c))
}

/// Whether `value` means "left blank" (empty, `<empty>`, an em-dash, a hyphen).
pub fn is_placeholder(value: &str) -> bool {
    DEFAULT_PLACEHOLDERS.contains(trim_line(value))
}

/// Config-aware version of [`is_placeholder`].
pub(crate) fn is_placeholder_with_config(value: &str, config: &ExtractionConfig) -> bool {
    let trimmed = trim_line(value);
    trimmed.is_empty() || config.placeholder_tokens.contains(trimmed)
}

/// Trim a captured value and map placeholder tokens to the empty string.
///
/// Idempotent: `clean(&clean(s)) == clean(s)`.
pub fn clean(value: &str) -> String {
    if is_placeholder(value) {
        String::new()
    } else {
        trim_line(value).to_string()
    }
}

/// Config-aware version of [`clean`].
pub(crate) fn clean_with_config(value: &str, config: &ExtractionConfig) -> String {
    if is_placeholder_with_config(value, config) {
        String::new()
    } else {
        trim_line(value).to_string()
    }
}

/// Everything after the first colon, trimmed. Empty when there is no colon.
pub fn after_colon(line: &str) -> &str {
    line.split_once(':').map_or("", |(_, rest)| trim_line(rest))
}

/// Net bracket depth: count of `[` minus count of `]`.
pub fn bracket_depth(text: &str) -> i64 {
    text.chars().fold(0, |depth, c| match c {
        '[' => depth + 1,
        ']' => depth - 1,
        _ => depth,
    })
}
