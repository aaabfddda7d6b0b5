//! Query-time retrieval: ranked, deduplicated evidence for one question

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::index::IndexManager;
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, ChunkId, RetrievedRef};

/// One retrieved chunk with its similarity score and 1-based rank
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Similarity score (higher is more similar)
    pub score: f32,
    /// Rank in the evidence ordering, starting at 1
    pub rank: u32,
}

/// The ranked retrieval result for one question. Transient: scoped to a
/// single query, empty when the index has no chunks or nothing clears the
/// minimum-score threshold.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    hits: Vec<ScoredChunk>,
}

impl Evidence {
    /// Evidence with no hits: the trigger for the refusal path
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Ranked hits, best first
    pub fn hits(&self) -> &[ScoredChunk] {
        &self.hits
    }

    /// The retrieval trace carried in every answer payload
    pub fn to_refs(&self) -> Vec<RetrievedRef> {
        self.hits
            .iter()
            .map(|h| RetrievedRef {
                page: h.chunk.page_number,
                chunk_id: h.chunk.id.clone(),
                score: h.score,
                rank: h.rank,
            })
            .collect()
    }

    /// Whether the evidence contains a chunk on the given page
    pub fn contains_page(&self, page: u32) -> bool {
        self.hits.iter().any(|h| h.chunk.page_number == page)
    }

    /// The best-ranked chunk on a page, if any
    pub fn best_on_page(&self, page: u32) -> Option<&ScoredChunk> {
        self.hits.iter().find(|h| h.chunk.page_number == page)
    }

    /// Look up a hit by exact chunk id
    pub fn by_chunk_id(&self, id: &ChunkId) -> Option<&ScoredChunk> {
        self.hits.iter().find(|h| &h.chunk.id == id)
    }
}

/// Wraps the index manager to produce [`Evidence`] for a query
pub struct Retriever {
    index: Arc<IndexManager>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Create a retriever over an index
    pub fn new(
        index: Arc<IndexManager>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Retrieve evidence for a question.
    ///
    /// The search vector is built from the query text alone; conversation
    /// history never reaches the embedding, so retrieval for a given
    /// question is deterministic across turns.
    pub async fn retrieve(&self, query_text: &str, k: usize) -> Result<Evidence> {
        if self.index.chunk_count()? == 0 {
            return Ok(Evidence::empty());
        }

        let vector = self.embedder.embed(query_text).await?;
        // Fetch with headroom so threshold filtering and dedup still leave
        // k candidates when possible
        let hits = self.index.query(&vector, k.saturating_mul(2)).await?;

        let mut scored = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some(chunk) = self.index.chunk(&hit.chunk_id) {
                scored.push((chunk, hit.score));
            } else {
                tracing::warn!(chunk_id = %hit.chunk_id, "search hit not in catalog; dropped");
            }
        }

        let evidence = rank_evidence(scored, self.config.min_score, k);
        tracing::debug!(
            query = query_text,
            hits = evidence.len(),
            "retrieval complete"
        );
        Ok(evidence)
    }

    /// The configured default number of chunks per question
    pub fn default_top_k(&self) -> usize {
        self.config.top_k
    }
}

/// Deduplicate, threshold, order, and rank raw matches.
///
/// Matches resolving to the same chunk id keep their highest score. Ordering
/// is by descending score with ties broken by ascending page then ordinal,
/// so repeated retrieval over a fixed corpus reproduces citations exactly.
fn rank_evidence(scored: Vec<(Chunk, f32)>, min_score: f32, k: usize) -> Evidence {
    let mut best: HashMap<ChunkId, (Chunk, f32)> = HashMap::new();
    for (chunk, score) in scored {
        match best.entry(chunk.id.clone()) {
            Entry::Occupied(mut entry) => {
                if score > entry.get().1 {
                    entry.get_mut().1 = score;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert((chunk, score));
            }
        }
    }

    let mut hits: Vec<(Chunk, f32)> = best
        .into_values()
        .filter(|(_, score)| *score >= min_score)
        .collect();

    hits.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| a.0.page_number.cmp(&b.0.page_number))
            .then_with(|| a.0.ordinal.cmp(&b.0.ordinal))
    });
    hits.truncate(k);

    Evidence {
        hits: hits
            .into_iter()
            .enumerate()
            .map(|(i, (chunk, score))| ScoredChunk {
                chunk,
                score,
                rank: i as u32 + 1,
            })
            .collect(),
    }
}

/// Build ranked evidence straight from scored chunks; test seam for the
/// grounding engine
#[cfg(test)]
pub(crate) fn evidence_from_hits(hits: Vec<(Chunk, f32)>) -> Evidence {
    rank_evidence(hits, f32::NEG_INFINITY, usize::MAX)
}
