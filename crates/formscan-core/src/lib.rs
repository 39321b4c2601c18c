pub mod config_file;
pub mod document;
pub mod record;

pub use document::{
    Block, BlockSource, BoundingBox, DocumentError, ParsedDocument, load_blocks_file,
    load_blocks_json,
};
pub use record::{FieldRecord, FilerInformation, ForeignIdentification};
