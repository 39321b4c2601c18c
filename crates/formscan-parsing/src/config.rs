use std::collections::HashSet;

use formscan_core::config_file::ExtractionSection;
use once_cell::sync::Lazy;
use regex::Regex;

/// Glyphs that mark a checkbox as ticked when OCR renders it as `[x]`, `[✓]`, ...
pub const DEFAULT_CHECKBOX_MARKS: &[&str] = &["x", "X", "\u{2611}", "\u{2713}"];

/// Values meaning "left blank". Covers the em-dash as a literal, as an
/// escaped `\u2014` sequence, as HTML entities and as UTF-8 read as cp1252.
pub const DEFAULT_PLACEHOLDER_TOKENS: &[&str] = &[
    "",
    "<empty>",
    "\u{2014}",
    "\\u2014",
    "&mdash;",
    "&#8212;",
    "\u{e2}\u{20ac}\u{201d}",
    "-",
];

/// Section header that OCR sometimes glues onto the preceding line.
pub const DEFAULT_SECTION_HEADER: &str = "Part I - Filer Information";

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn push(&mut self, value: T) {
        match self {
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(value),
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
        }
    }
}

/// What to do with a table blob whose brackets never balance before input ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IncompleteBlobPolicy {
    /// Drop the buffered lines; no `Filer_Information` is produced.
    #[default]
    Discard,
    /// Parse whatever was buffered.
    BestEffort,
}

/// Regexes derived from the checkbox mark glyph set.
#[derive(Debug, Clone)]
pub(crate) struct MarkPatterns {
    /// A mark inside square brackets, e.g. `[x]`.
    pub(crate) bracketed: Regex,
    /// A `["Yes", "<mark>"]` cell pair.
    pub(crate) yes_checked: Regex,
    /// A `["No", "<mark>"]` cell pair.
    pub(crate) no_checked: Regex,
}

impl MarkPatterns {
    pub(crate) fn compile(marks: &[String]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = marks
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| regex::escape(m))
            .collect();
        // An empty set must never match, not match "[]".
        let mark = if alternatives.is_empty() {
            r"[^\s\S]".to_string()
        } else {
            alternatives.join("|")
        };

        let checked = format!(r"(?:\[\s*(?:{mark})\s*\]|(?:{mark}))");
        // Mark in its own cell (`["Yes","[x]"]`) or inline (`["Yes [x]"]`).
        let option = |label: &str| {
            Regex::new(&format!(
                r#"(?:\[\s*"{label}"\s*,\s*"\s*{checked}\s*"|"{label}\s*{checked}\s*")"#
            ))
        };

        Ok(Self {
            bracketed: Regex::new(&format!(r"\[(?:{mark})\]"))?,
            yes_checked: option("Yes")?,
            no_checked: option("No")?,
        })
    }
}

static DEFAULT_MARK_PATTERNS: Lazy<MarkPatterns> = Lazy::new(|| {
    let marks: Vec<String> = DEFAULT_CHECKBOX_MARKS.iter().map(|s| s.to_string()).collect();
    MarkPatterns::compile(&marks).unwrap()
});

/// Configuration for the field extraction engine.
///
/// Use [`ExtractionConfigBuilder`] to override the glyph and placeholder sets.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub(crate) checkbox_marks: Vec<String>,
    /// `None` means the marks are the defaults and the shared patterns apply.
    pub(crate) mark_patterns: Option<MarkPatterns>,
    pub(crate) placeholder_tokens: HashSet<String>,
    pub(crate) section_header: String,
    pub(crate) incomplete_blob: IncompleteBlobPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            checkbox_marks: DEFAULT_CHECKBOX_MARKS.iter().map(|s| s.to_string()).collect(),
            mark_patterns: None,
            placeholder_tokens: DEFAULT_PLACEHOLDER_TOKENS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            section_header: DEFAULT_SECTION_HEADER.to_string(),
            incomplete_blob: IncompleteBlobPolicy::Discard,
        }
    }
}

impl ExtractionConfig {
    pub(crate) fn marks(&self) -> &MarkPatterns {
        self.mark_patterns.as_ref().unwrap_or(&*DEFAULT_MARK_PATTERNS)
    }

    /// Resolved checkbox mark glyphs.
    pub fn checkbox_marks(&self) -> &[String] {
        &self.checkbox_marks
    }

    /// Resolved placeholder tokens, sorted.
    pub fn placeholder_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.placeholder_tokens.iter().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    pub fn section_header(&self) -> &str {
        &self.section_header
    }

    pub fn incomplete_blob(&self) -> IncompleteBlobPolicy {
        self.incomplete_blob
    }
}

/// Builder for [`ExtractionConfig`].
///
/// Mark glyphs are compiled into regexes in [`build()`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ExtractionConfigBuilder {
    checkbox_marks: ListOverride<String>,
    placeholder_tokens: ListOverride<String>,
    section_header: Option<String>,
    incomplete_blob: Option<IncompleteBlobPolicy>,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the `[extraction]` section of a config file.
    ///
    /// A replacing list is applied before the `extra_*` list is appended.
    pub fn from_section(section: &ExtractionSection) -> Self {
        let mut builder = Self::new();
        if let Some(marks) = &section.checkbox_marks {
            builder = builder.set_checkbox_marks(marks.clone());
        }
        for mark in section.extra_checkbox_marks.iter().flatten() {
            builder = builder.add_checkbox_mark(mark.clone());
        }
        if let Some(tokens) = &section.placeholder_tokens {
            builder = builder.set_placeholder_tokens(tokens.clone());
        }
        for token in section.extra_placeholder_tokens.iter().flatten() {
            builder = builder.add_placeholder_token(token.clone());
        }
        if let Some(header) = &section.section_header {
            builder = builder.section_header(header);
        }
        if let Some(keep) = section.keep_incomplete_blob {
            builder = builder.incomplete_blob(if keep {
                IncompleteBlobPolicy::BestEffort
            } else {
                IncompleteBlobPolicy::Discard
            });
        }
        builder
    }

    // ── Checkbox marks ──

    pub fn set_checkbox_marks(mut self, marks: Vec<String>) -> Self {
        self.checkbox_marks = ListOverride::Replace(marks);
        self
    }

    pub fn add_checkbox_mark(mut self, mark: String) -> Self {
        self.checkbox_marks.push(mark);
        self
    }

    // ── Placeholder tokens ──

    pub fn set_placeholder_tokens(mut self, tokens: Vec<String>) -> Self {
        self.placeholder_tokens = ListOverride::Replace(tokens);
        self
    }

    pub fn add_placeholder_token(mut self, token: String) -> Self {
        self.placeholder_tokens.push(token);
        self
    }

    // ── Scalars ──

    pub fn section_header(mut self, header: &str) -> Self {
        self.section_header = Some(header.to_string());
        self
    }

    pub fn incomplete_blob(mut self, policy: IncompleteBlobPolicy) -> Self {
        self.incomplete_blob = Some(policy);
        self
    }

    /// Resolve list overrides and compile mark regexes into an [`ExtractionConfig`].
    pub fn build(self) -> Result<ExtractionConfig, regex::Error> {
        let default_marks: Vec<String> =
            DEFAULT_CHECKBOX_MARKS.iter().map(|s| s.to_string()).collect();
        let default_tokens: Vec<String> = DEFAULT_PLACEHOLDER_TOKENS
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mark_patterns = match &self.checkbox_marks {
            ListOverride::Default => None,
            custom => Some(MarkPatterns::compile(&custom.resolve(&default_marks))?),
        };

        let section_header = self
            .section_header
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_SECTION_HEADER.to_string());

        Ok(ExtractionConfig {
            checkbox_marks: self.checkbox_marks.resolve(&default_marks),
            mark_patterns,
            placeholder_tokens: self
                .placeholder_tokens
                .resolve(&default_tokens)
                .into_iter()
                .collect(),
            section_header,
            incomplete_blob: self.incomplete_blob.unwrap_or_default(),
        })
    }
}
