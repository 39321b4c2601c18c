use formscan_core::{Block, FieldRecord};

use crate::accumulator::{BlobAccumulator, BlobProgress};
use crate::classifier::{FieldUpdate, LineAction, LineClassifier};
use crate::config::{ExtractionConfig, IncompleteBlobPolicy};
use crate::normalize::trim_line;
use crate::table;

/// A configurable block-to-field extraction engine.
///
/// Holds an [`ExtractionConfig`] and no per-page state, so one extractor can
/// be shared across threads; every extraction runs on a fresh [`BlockReducer`].
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    config: ExtractionConfig,
}

impl FieldExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
        }
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Start a streaming extraction.
    pub fn reducer(&self) -> BlockReducer<'_> {
        BlockReducer::new(&self.config)
    }

    /// Reduce an ordered block sequence into a field record.
    pub fn extract(&self, blocks: &[Block]) -> FieldRecord {
        let mut reducer = self.reducer();
        for block in blocks {
            reducer.feed(block);
        }
        reducer.finish()
    }

    /// Reduce raw block contents; `None` entries are skipped like non-string blocks.
    pub fn extract_texts<'b, I>(&self, texts: I) -> FieldRecord
    where
        I: IntoIterator<Item = Option<&'b str>>,
    {
        let mut reducer = self.reducer();
        for text in texts.into_iter().flatten() {
            reducer.feed_text(text);
        }
        reducer.finish()
    }

    /// Run one block through a fresh state, as a minimal reproducer.
    pub fn extract_single(&self, block: &Block) -> FieldRecord {
        self.extract(std::slice::from_ref(block))
    }
}

/// Reduce blocks with the default configuration.
pub fn extract_fields(blocks: &[Block]) -> FieldRecord {
    FieldExtractor::new().extract(blocks)
}

/// Per-pass extraction state.
///
/// Consumes blocks strictly in order. Between blocks it is either scanning
/// lines or accumulating a table blob; while accumulating no line rule runs.
pub struct BlockReducer<'c> {
    config: &'c ExtractionConfig,
    classifier: LineClassifier<'c>,
    record: FieldRecord,
    expecting_name: bool,
    blob: BlobAccumulator,
}

impl<'c> BlockReducer<'c> {
    pub fn new(config: &'c ExtractionConfig) -> Self {
        Self {
            config,
            classifier: LineClassifier::new(config),
            record: FieldRecord::default(),
            expecting_name: false,
            blob: BlobAccumulator::new(),
        }
    }

    pub fn is_accumulating(&self) -> bool {
        self.blob.is_accumulating()
    }

    pub fn is_expecting_name(&self) -> bool {
        self.expecting_name
    }

    /// Fields collected so far.
    pub fn record(&self) -> &FieldRecord {
        &self.record
    }

    /// Feed one block. Blocks without string content are skipped.
    pub fn feed(&mut self, block: &Block) {
        match block.text() {
            Some(text) => self.feed_text(text),
            None => tracing::trace!("skipping block without string content"),
        }
    }

    /// Feed one block's raw content.
    pub fn feed_text(&mut self, raw: &str) {
        let line = trim_line(raw);
        if line.is_empty() {
            return;
        }

        if self.blob.is_accumulating() {
            if let BlobProgress::Complete(joined) = self.blob.push(raw) {
                self.complete_blob(&joined);
            }
            return;
        }

        if let Some((before, after)) = line.split_once(self.config.section_header()) {
            self.feed_glued_header(trim_line(before), trim_line(after));
            return;
        }

        self.classify(line, raw);
    }

    /// Finish the pass. An unbalanced blob is handled per [`IncompleteBlobPolicy`].
    pub fn finish(mut self) -> FieldRecord {
        if let Some(partial) = self.blob.take_incomplete() {
            if trim_line(&partial).is_empty() {
                tracing::debug!("table blob closed with nothing buffered");
                return self.record;
            }
            match self.config.incomplete_blob() {
                IncompleteBlobPolicy::Discard => {
                    tracing::debug!(
                        bytes = partial.len(),
                        "dropping table blob with unbalanced brackets"
                    );
                }
                IncompleteBlobPolicy::BestEffort => {
                    tracing::debug!(
                        bytes = partial.len(),
                        "parsing table blob with unbalanced brackets"
                    );
                    self.complete_blob(&partial);
                }
            }
        }
        self.record
    }

    /// A line with the section header glued inside it: the text before the
    /// header is classified on its own, the text after it starts the blob.
    fn feed_glued_header(&mut self, before: &str, after: &str) {
        tracing::debug!(before, after, "splitting glued section header");

        if !before.is_empty() {
            self.classify(before, before);
        }

        if self.blob.is_accumulating() {
            tracing::debug!(
                lines = self.blob.buffered_lines(),
                "discarding blob opened before section header"
            );
        }

        // Text after the header that is not a blob is dropped; the next block
        // then becomes the first buffered line.
        let seed = if after.starts_with("[[") { after } else { "" };
        self.start_blob(seed);
    }

    fn classify(&mut self, line: &str, raw: &str) {
        let action = self.classifier.classify(line, self.expecting_name);
        match action {
            LineAction::Set(update) => {
                if matches!(update, FieldUpdate::Name(_)) {
                    self.expecting_name = false;
                }
                update.apply(&mut self.record);
            }
            LineAction::ExpectName => self.expecting_name = true,
            LineAction::StartTable => self.start_blob(raw),
            LineAction::Ignore => {}
        }
    }

    fn start_blob(&mut self, seed: &str) {
        tracing::debug!(seed_bytes = seed.len(), "table blob started");
        if let BlobProgress::Complete(joined) = self.blob.begin(seed) {
            self.complete_blob(&joined);
        }
    }

    fn complete_blob(&mut self, joined: &str) {
        tracing::debug!(bytes = joined.len(), "table blob complete");
        self.record.filer_information =
            Some(table::parse_table_blob_with_config(joined, self.config));
    }
}
