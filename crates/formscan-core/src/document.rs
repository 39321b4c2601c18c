use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a parse result object or an array of blocks, found {0}")]
    UnsupportedShape(&'static str),
}

/// One text fragment emitted by the document parser.
///
/// Only `content` is read by the extraction engine. Everything else the
/// parser attaches (type, confidence, geometry) is ignored apart from the
/// page number, which is used to select a page's blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Block {
    /// A block carrying a string content and no position.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: Some(Value::String(text.into())),
            bbox: None,
        }
    }

    /// A block carrying a string content on the given page.
    pub fn on_page(text: impl Into<String>, page: i64) -> Self {
        Self {
            content: Some(Value::String(text.into())),
            bbox: Some(BoundingBox {
                page: Some(Value::from(page)),
            }),
        }
    }

    /// The block's content if it is a string. Non-string contents yield `None`.
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }

    /// The page this block sits on, if the parser reported an integer page.
    pub fn page(&self) -> Option<i64> {
        self.bbox.as_ref().and_then(BoundingBox::page)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Value>,
}

impl BoundingBox {
    pub fn page(&self) -> Option<i64> {
        self.page.as_ref().and_then(Value::as_i64)
    }
}

/// Top-level document parser output: `{"result": {"chunks": [{"blocks": [...]}]}}`.
///
/// Every level tolerates missing or `null` collections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedDocument {
    #[serde(default)]
    pub result: Option<ParseResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseResult {
    #[serde(default)]
    pub chunks: Option<Vec<Chunk>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chunk {
    #[serde(default)]
    pub blocks: Option<Vec<Block>>,
}

impl ParsedDocument {
    /// Every block in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.result
            .iter()
            .flat_map(|r| r.chunks.iter().flatten())
            .flat_map(|c| c.blocks.iter().flatten())
    }

    /// Sorted, distinct pages that carry at least one block.
    pub fn present_pages(&self) -> Vec<i64> {
        self.blocks()
            .filter_map(Block::page)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Resolve the page actually holding the requested content.
    ///
    /// The parser renumbers single-page uploads, so when the requested page
    /// is missing and exactly one page is present, that page is used.
    pub fn effective_page(&self, requested: i64) -> i64 {
        let pages = self.present_pages();
        if pages.contains(&requested) {
            return requested;
        }
        if let [only] = pages.as_slice() {
            return *only;
        }
        requested
    }

    /// All blocks on the effective page for `requested`, in document order.
    pub fn blocks_for_page(&self, requested: i64) -> Vec<Block> {
        let page = self.effective_page(requested);
        self.blocks()
            .filter(|b| b.page() == Some(page))
            .cloned()
            .collect()
    }

    /// String contents of the blocks on the effective page.
    pub fn page_texts(&self, requested: i64) -> Vec<String> {
        self.blocks_for_page(requested)
            .iter()
            .filter_map(|b| b.text().map(str::to_string))
            .collect()
    }
}

/// Input accepted from disk: either a full parse result or a bare block list.
#[derive(Debug, Clone)]
pub enum BlockSource {
    Document(ParsedDocument),
    Blocks(Vec<Block>),
}

impl BlockSource {
    /// Blocks to feed the engine. A bare block list is used as-is; a parse
    /// result is narrowed to the requested page.
    pub fn page_blocks(&self, requested: i64) -> Vec<Block> {
        match self {
            BlockSource::Document(doc) => doc.blocks_for_page(requested),
            BlockSource::Blocks(blocks) => blocks.clone(),
        }
    }
}

/// Read a JSON file holding either a parse result object or an array of blocks.
pub fn load_blocks_file(path: &Path) -> Result<BlockSource, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    load_blocks_json(&content)
}

/// Parse JSON text holding either a parse result object or an array of blocks.
pub fn load_blocks_json(json: &str) -> Result<BlockSource, DocumentError> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(_) => Ok(BlockSource::Blocks(serde_json::from_value(value)?)),
        Value::Object(_) => Ok(BlockSource::Document(serde_json::from_value(value)?)),
        Value::Null => Err(DocumentError::UnsupportedShape("null")),
        Value::Bool(_) => Err(DocumentError::UnsupportedShape("a boolean")),
        Value::Number(_) => Err(DocumentError::UnsupportedShape("a number")),
        Value::String(_) => Err(DocumentError::UnsupportedShape("a string")),
    }
}
