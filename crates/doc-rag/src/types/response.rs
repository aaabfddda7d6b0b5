//! Answer payload types returned to callers

use serde::{Deserialize, Serialize};

use super::document::ChunkId;

/// A source location cited by an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Page number the citation points at
    pub page: u32,
    /// Chunk the citation resolves to
    pub chunk_id: ChunkId,
}

/// One entry of the retrieval trace: what was retrieved for a question,
/// regardless of whether the final answer was grounded or refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRef {
    /// Page number of the retrieved chunk
    pub page: u32,
    /// Retrieved chunk id
    pub chunk_id: ChunkId,
    /// Similarity score (higher is more similar)
    pub score: f32,
    /// 1-based rank in the evidence ordering
    pub rank: u32,
}

/// The answer payload for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    /// Answer text, or the exact refusal literal when the document lacks
    /// the information
    pub answer: String,
    /// Citations validated against this question's evidence
    pub citations: Vec<Citation>,
    /// Full ranked retrieval trace for this question
    pub retrieved: Vec<RetrievedRef>,
}

impl GroundedAnswer {
    /// True if this answer is the refusal outcome
    pub fn is_refusal(&self) -> bool {
        self.answer == crate::generation::REFUSAL && self.citations.is_empty()
    }
}
