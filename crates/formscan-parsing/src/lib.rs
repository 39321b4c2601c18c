//! Field extraction for one OCR'd page of a filing form.
//!
//! Pipeline, a single forward pass over the page's blocks:
//! 1. Trim each block; skip blocks without string content
//! 2. While a table blob is open, buffer the block until brackets balance
//! 3. Split a glued "Part I - Filer Information" header into its fragments
//! 4. Classify the line against the ordered rule table
//! 5. Parse each completed blob into the nested `Filer_Information` record

pub mod accumulator;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod normalize;
pub mod table;

pub use accumulator::{BlobAccumulator, BlobProgress};
pub use classifier::{FieldUpdate, LINE_RULES, LineAction, LineClassifier, LineRule};
pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, IncompleteBlobPolicy, ListOverride,
};
pub use extractor::{BlockReducer, FieldExtractor, extract_fields};
pub use table::parse_table_blob;
// Re-export domain types from core (canonical definitions live there)
pub use formscan_core::{Block, FieldRecord, FilerInformation, ForeignIdentification};
