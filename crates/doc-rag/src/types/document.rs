//! Page and chunk types with location tracking for citations

use serde::{Deserialize, Serialize};
use std::fmt;

/// One page of extracted document text, as produced by the external
/// extractor. Page numbers are 1-indexed and ascending; they need not be
/// contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number
    pub number: u32,
    /// Raw extracted page text
    pub text: String,
}

impl Page {
    /// Create a new page
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Deterministic chunk identifier derived from page number and per-page
/// ordinal. Re-chunking identical input reproduces identical ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    /// Build the id for a chunk at `(page_number, ordinal)`
    pub fn new(page_number: u32, ordinal: u32) -> Self {
        Self(format!("p{}-c{}", page_number, ordinal))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bounded, page-anchored unit of document text. The atomic retrievable
/// item: created during ingestion, never mutated, destroyed only by a full
/// index rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic chunk id
    pub id: ChunkId,
    /// Page this chunk was cut from
    pub page_number: u32,
    /// Position of the chunk within its page, starting at 0
    pub ordinal: u32,
    /// Chunk text, a contiguous substring of the page text
    pub text: String,
    /// Byte span of `text` within the page text
    pub char_span: (usize, usize),
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        page_number: u32,
        ordinal: u32,
        text: impl Into<String>,
        char_span: (usize, usize),
    ) -> Self {
        Self {
            id: ChunkId::new(page_number, ordinal),
            page_number,
            ordinal,
            text: text.into(),
            char_span,
        }
    }

    /// Citation tag for this chunk, as it appears in generation prompts
    pub fn citation_tag(&self) -> String {
        format!("[p{}:c{}]", self.page_number, self.ordinal)
    }
}
