use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use formscan_core::config_file::{self, ConfigFile};
use formscan_core::{Block, BlockSource, FieldRecord, load_blocks_file};
use formscan_parsing::{ExtractionConfigBuilder, FieldExtractor};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Default form page holding Part I.
const DEFAULT_PAGE: i64 = 3;

/// Form field extractor - rebuild structured fields from document-parser blocks
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (default: .formscan.toml over the platform config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract fields from a page of parser output and print them as JSON
    Extract {
        /// Parse result JSON, or a JSON array of blocks
        file_path: PathBuf,

        /// Page to read from a parse result
        #[arg(short, long)]
        page: Option<i64>,

        /// Write the JSON record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit single-line JSON
        #[arg(long)]
        compact: bool,

        /// Parse a table blob left open at the end of the page instead of dropping it
        #[arg(long)]
        keep_incomplete_blob: bool,
    },

    /// Run the extractor on a single block with fresh state
    Reproduce {
        /// Parse result JSON, or a JSON array of blocks
        file_path: PathBuf,

        /// Zero-based index of the block within the page
        #[arg(short, long)]
        block: usize,

        /// Page to read from a parse result
        #[arg(short, long)]
        page: Option<i64>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the blocks of a page with their index
    Blocks {
        /// Parse result JSON, or a JSON array of blocks
        file_path: PathBuf,

        /// Page to read from a parse result
        #[arg(short, long)]
        page: Option<i64>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = match &cli.config {
        Some(path) => config_file::load_required(path)?,
        None => config_file::load_config(),
    };

    match cli.command {
        Command::Extract {
            file_path,
            page,
            output,
            compact,
            keep_incomplete_blob,
        } => extract(
            &file_config,
            &file_path,
            page,
            output,
            compact,
            keep_incomplete_blob,
        ),
        Command::Reproduce {
            file_path,
            block,
            page,
            no_color,
        } => reproduce(&file_config, &file_path, block, page, no_color),
        Command::Blocks {
            file_path,
            page,
            no_color,
        } => list_blocks(&file_config, &file_path, page, no_color),
    }
}

fn extract(
    file_config: &ConfigFile,
    file_path: &Path,
    page: Option<i64>,
    output: Option<PathBuf>,
    compact: bool,
    keep_incomplete_blob: bool,
) -> anyhow::Result<()> {
    let page = resolve_page(file_config, page);
    let blocks = load_page_blocks(file_path, page)?;
    let extractor = build_extractor(file_config, keep_incomplete_blob)?;

    tracing::info!(file = %file_path.display(), page, blocks = blocks.len(), "extracting fields");
    let record = extractor.extract(&blocks);

    let pretty = !compact
        && file_config
            .output
            .as_ref()
            .and_then(|o| o.pretty)
            .unwrap_or(true);

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(
            std::fs::File::create(output_path)
                .with_context(|| format!("creating {}", output_path.display()))?,
        )
    } else {
        Box::new(std::io::stdout())
    };
    write_record(&mut writer, &record, pretty)?;
    Ok(())
}

fn reproduce(
    file_config: &ConfigFile,
    file_path: &Path,
    index: usize,
    page: Option<i64>,
    no_color: bool,
) -> anyhow::Result<()> {
    let page = resolve_page(file_config, page);
    let blocks = load_page_blocks(file_path, page)?;
    let Some(block) = blocks.get(index) else {
        anyhow::bail!(
            "Block {} out of range: page {} has {} blocks",
            index,
            page,
            blocks.len()
        );
    };

    let extractor = build_extractor(file_config, false)?;
    let record = extractor.extract_single(block);

    let color = resolve_color(file_config, no_color);
    let mut stdout = std::io::stdout();
    output::print_block(&mut stdout, index, block, color)?;
    writeln!(stdout)?;
    write_record(&mut stdout, &record, true)?;
    Ok(())
}

fn list_blocks(
    file_config: &ConfigFile,
    file_path: &Path,
    page: Option<i64>,
    no_color: bool,
) -> anyhow::Result<()> {
    let page = resolve_page(file_config, page);
    let blocks = load_page_blocks(file_path, page)?;
    let extractor = build_extractor(file_config, false)?;
    let color = resolve_color(file_config, no_color);

    let mut stdout = std::io::stdout();
    output::print_page_header(&mut stdout, file_path, page, blocks.len(), color)?;
    for (i, block) in blocks.iter().enumerate() {
        output::print_block_summary(&mut stdout, i, block, extractor.config(), color)?;
    }
    Ok(())
}

/// CLI flag > `FORMSCAN_PAGE` env var > config file > default page.
fn resolve_page(file_config: &ConfigFile, page: Option<i64>) -> i64 {
    page.or_else(|| {
        std::env::var("FORMSCAN_PAGE")
            .ok()
            .and_then(|v| v.parse().ok())
    })
    .or_else(|| file_config.output.as_ref().and_then(|o| o.page))
    .unwrap_or(DEFAULT_PAGE)
}

fn resolve_color(file_config: &ConfigFile, no_color: bool) -> ColorMode {
    let configured = file_config
        .output
        .as_ref()
        .and_then(|o| o.color)
        .unwrap_or(true);
    ColorMode(configured && !no_color && std::env::var_os("NO_COLOR").is_none())
}

fn build_extractor(
    file_config: &ConfigFile,
    keep_incomplete_blob: bool,
) -> anyhow::Result<FieldExtractor> {
    let mut builder = file_config
        .extraction
        .as_ref()
        .map(ExtractionConfigBuilder::from_section)
        .unwrap_or_default();
    if keep_incomplete_blob {
        builder = builder.incomplete_blob(formscan_parsing::IncompleteBlobPolicy::BestEffort);
    }
    let config = builder
        .build()
        .context("invalid checkbox mark configuration")?;
    Ok(FieldExtractor::with_config(config))
}

fn load_page_blocks(file_path: &Path, page: i64) -> anyhow::Result<Vec<Block>> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let source = load_blocks_file(file_path)
        .with_context(|| format!("loading blocks from {}", file_path.display()))?;

    if let BlockSource::Document(doc) = &source {
        let effective = doc.effective_page(page);
        if effective != page {
            tracing::info!(requested = page, effective, "page renumbered by parser");
        }
    }
    Ok(source.page_blocks(page))
}

fn write_record(w: &mut dyn Write, record: &FieldRecord, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *w, record)?;
    } else {
        serde_json::to_writer(&mut *w, record)?;
    }
    writeln!(w)?;
    Ok(())
}
