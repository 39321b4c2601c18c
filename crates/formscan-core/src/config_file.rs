use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionSection>,
    pub output: Option<OutputSection>,
}

/// Heuristic knobs for the field extraction engine.
///
/// `checkbox_marks` / `placeholder_tokens` replace the built-in lists;
/// the `extra_*` variants append to them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub checkbox_marks: Option<Vec<String>>,
    pub extra_checkbox_marks: Option<Vec<String>>,
    pub placeholder_tokens: Option<Vec<String>>,
    pub extra_placeholder_tokens: Option<Vec<String>>,
    pub section_header: Option<String>,
    pub keep_incomplete_blob: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub page: Option<i64>,
    pub pretty: Option<bool>,
    pub color: Option<bool>,
}

/// Platform config directory path: `<config_dir>/formscan/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("formscan").join("config.toml"))
}

/// Load config by cascading CWD `.formscan.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".formscan.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Load a config the user pointed at explicitly; unlike [`load_from_path`],
/// a missing or malformed file is an error.
pub fn load_required(path: &Path) -> Result<ConfigFile, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let be = base.extraction.unwrap_or_default();
    let oe = overlay.extraction.unwrap_or_default();
    let bo = base.output.unwrap_or_default();
    let oo = overlay.output.unwrap_or_default();

    ConfigFile {
        extraction: Some(ExtractionSection {
            checkbox_marks: oe.checkbox_marks.or(be.checkbox_marks),
            extra_checkbox_marks: oe.extra_checkbox_marks.or(be.extra_checkbox_marks),
            placeholder_tokens: oe.placeholder_tokens.or(be.placeholder_tokens),
            extra_placeholder_tokens: oe.extra_placeholder_tokens.or(be.extra_placeholder_tokens),
            section_header: oe.section_header.or(be.section_header),
            keep_incomplete_blob: oe.keep_incomplete_blob.or(be.keep_incomplete_blob),
        }),
        output: Some(OutputSection {
            page: oo.page.or(bo.page),
            pretty: oo.pretty.or(bo.pretty),
            color: oo.color.or(bo.color),
        }),
    }
}
