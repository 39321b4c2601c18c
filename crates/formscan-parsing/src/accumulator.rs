use crate::normalize::bracket_depth;

/// Result of feeding the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobProgress {
    /// Brackets are still open; more blocks are needed.
    Pending,
    /// Brackets balanced. Holds the buffered lines joined with `\n`.
    Complete(String),
}

/// Collects a bracketed table blob that may span several blocks.
///
/// Termination is a net count of `[` minus `]` over everything buffered so
/// far; the blob completes as soon as it drops to zero or below. Quotes and
/// bracket order are not checked.
#[derive(Debug, Default)]
pub struct BlobAccumulator {
    active: bool,
    buffer: Vec<String>,
    depth: i64,
}

impl BlobAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_accumulating(&self) -> bool {
        self.active
    }

    /// Number of lines buffered for the open blob.
    pub fn buffered_lines(&self) -> usize {
        self.buffer.len()
    }

    /// Start a blob, discarding any open one.
    ///
    /// A non-empty seed is buffered and checked immediately, so a single-line
    /// blob completes without entering accumulation. An empty seed always
    /// waits for the next block.
    pub fn begin(&mut self, seed: &str) -> BlobProgress {
        self.active = true;
        self.buffer.clear();
        self.depth = 0;
        if seed.is_empty() {
            return BlobProgress::Pending;
        }
        self.push(seed)
    }

    /// Append one block's raw content to the open blob.
    pub fn push(&mut self, raw: &str) -> BlobProgress {
        self.buffer.push(raw.to_string());
        self.depth += bracket_depth(raw);
        if self.depth <= 0 {
            BlobProgress::Complete(self.take_joined())
        } else {
            BlobProgress::Pending
        }
    }

    /// Close the open blob without balancing it, returning what was buffered.
    ///
    /// `None` when no blob is open.
    pub fn take_incomplete(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        Some(self.take_joined())
    }

    fn take_joined(&mut self) -> String {
        let joined = self.buffer.join("\n");
        self.buffer.clear();
        self.depth = 0;
        self.active = false;
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_blob_completes_on_begin() {
        let mut acc = BlobAccumulator::new();
        let progress = acc.begin(r#"[["Type of filer","Individual"]]"#);
        assert_eq!(
            progress,
            BlobProgress::Complete(r#"[["Type of filer","Individual"]]"#.to_string())
        );
        assert!(!acc.is_accumulating());
    }

    #[test]
    fn test_multi_block_blob_joins_with_newlines() {
        let mut acc = BlobAccumulator::new();
        assert_eq!(acc.begin(r#"[["Type of filer","Individual","#), BlobProgress::Pending);
        assert!(acc.is_accumulating());
        assert_eq!(acc.push(r#""TIN","123456789","#), BlobProgress::Pending);
        assert_eq!(acc.buffered_lines(), 2);
        assert_eq!(
            acc.push(r#""TIN type","SSN/ITIN"]]"#),
            BlobProgress::Complete(
                "[[\"Type of filer\",\"Individual\",\n\"TIN\",\"123456789\",\n\"TIN type\",\"SSN/ITIN\"]]"
                    .to_string()
            )
        );
        assert!(!acc.is_accumulating());
        assert_eq!(acc.buffered_lines(), 0);
    }

    #[test]
    fn test_empty_seed_waits_for_next_block() {
        let mut acc = BlobAccumulator::new();
        assert_eq!(acc.begin(""), BlobProgress::Pending);
        assert!(acc.is_accumulating());
        assert_eq!(acc.buffered_lines(), 0);
        assert_eq!(
            acc.push("[[\"a\"]]"),
            BlobProgress::Complete("[[\"a\"]]".to_string())
        );
    }

    #[test]
    fn test_bracketless_block_after_empty_seed_completes() {
        let mut acc = BlobAccumulator::new();
        acc.begin("");
        assert_eq!(acc.push("plain text"), BlobProgress::Complete("plain text".to_string()));
    }

    #[test]
    fn test_over_closed_blob_completes() {
        let mut acc = BlobAccumulator::new();
        acc.begin("[[\"a\",");
        assert_eq!(
            acc.push("\"b\"]]]"),
            BlobProgress::Complete("[[\"a\",\n\"b\"]]]".to_string())
        );
    }

    #[test]
    fn test_take_incomplete() {
        let mut acc = BlobAccumulator::new();
        assert_eq!(acc.take_incomplete(), None);
        acc.begin("[[\"a\",");
        acc.push("\"b\",");
        assert_eq!(acc.take_incomplete(), Some("[[\"a\",\n\"b\",".to_string()));
        assert!(!acc.is_accumulating());
        assert_eq!(acc.take_incomplete(), None);
    }

    #[test]
    fn test_begin_discards_open_blob() {
        let mut acc = BlobAccumulator::new();
        acc.begin("[[\"stale\",");
        assert_eq!(acc.begin("[[\"fresh\"]]"), BlobProgress::Complete("[[\"fresh\"]]".to_string()));
    }
}
