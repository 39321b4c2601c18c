use std::io::Write;
use std::path::Path;

use formscan_core::Block;
use formscan_parsing::normalize::trim_line;
use formscan_parsing::{ExtractionConfig, LineAction, LineClassifier};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

const PREVIEW_CHARS: usize = 100;

/// Single-line preview of a block's content.
fn preview(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

/// How a block would be read on its own, for the `blocks` listing.
fn block_kind(text: &str, config: &ExtractionConfig) -> &'static str {
    let line = trim_line(text);
    if line.is_empty() {
        return "blank";
    }
    if line.contains(config.section_header()) {
        return "glued header";
    }
    match LineClassifier::new(config).classify(line, false) {
        LineAction::Set(_) => "field",
        LineAction::ExpectName => "name label",
        LineAction::StartTable => "table start",
        LineAction::Ignore => "",
    }
}

pub fn print_page_header(
    w: &mut dyn Write,
    file_path: &Path,
    page: i64,
    count: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());
    if color.enabled() {
        writeln!(
            w,
            "{} page {} ({} blocks)\n",
            name.bold(),
            page,
            count
        )?;
    } else {
        writeln!(w, "{} page {} ({} blocks)\n", name, page, count)?;
    }
    Ok(())
}

/// One line per block: index, classification hint and content preview.
pub fn print_block_summary(
    w: &mut dyn Write,
    index: usize,
    block: &Block,
    config: &ExtractionConfig,
    color: ColorMode,
) -> std::io::Result<()> {
    let Some(text) = block.text() else {
        if color.enabled() {
            writeln!(w, "[{:>3}] {}", index, "(no text content)".dimmed())?;
        } else {
            writeln!(w, "[{:>3}] (no text content)", index)?;
        }
        return Ok(());
    };

    let kind = block_kind(text, config);
    let shown = preview(text);
    match (color.enabled(), kind) {
        (true, "") => writeln!(w, "[{:>3}] {}", index, shown)?,
        (true, "table start" | "glued header") => {
            writeln!(w, "[{:>3}] {} {}", index, format!("<{}>", kind).yellow(), shown)?
        }
        (true, _) => writeln!(w, "[{:>3}] {} {}", index, format!("<{}>", kind).cyan(), shown)?,
        (false, "") => writeln!(w, "[{:>3}] {}", index, shown)?,
        (false, _) => writeln!(w, "[{:>3}] <{}> {}", index, kind, shown)?,
    }
    Ok(())
}

/// Full content of the block run by `reproduce`.
pub fn print_block(
    w: &mut dyn Write,
    index: usize,
    block: &Block,
    color: ColorMode,
) -> std::io::Result<()> {
    let title = format!("Block {}", index);
    if color.enabled() {
        writeln!(w, "{}", title.bold().cyan())?;
    } else {
        writeln!(w, "{}", title)?;
    }
    match &block.content {
        Some(serde_json::Value::String(text)) => writeln!(w, "{}", text)?,
        Some(other) => writeln!(w, "(non-string content, skipped: {})", other)?,
        None => writeln!(w, "(no content, skipped)")?,
    }
    Ok(())
}
