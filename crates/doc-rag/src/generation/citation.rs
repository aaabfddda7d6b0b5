//! Citation marker parsing and validation
//!
//! Answers cite sources with `[p<page>]` (page-granular) or
//! `[p<page>:c<ordinal>]` (chunk-granular) markers. Validation is
//! fail-closed: markers that do not resolve into the question's evidence
//! are dropped, and an answer left with no valid citation is replaced by
//! the refusal literal rather than trusted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::retrieval::Evidence;
use crate::types::{Citation, ChunkId};

use super::REFUSAL;

static CITATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[p(\d+)(?::c(\d+))?\]").expect("invalid citation regex"));

/// A citation marker as written by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Cited page number
    pub page: u32,
    /// Cited chunk ordinal, when the chunk-granular form was used
    pub ordinal: Option<u32>,
}

/// Parse all citation markers in an answer, in order of appearance
pub fn parse_markers(answer: &str) -> Vec<Marker> {
    CITATION_PATTERN
        .captures_iter(answer)
        .filter_map(|cap| {
            let page: u32 = cap.get(1)?.as_str().parse().ok()?;
            let ordinal: Option<u32> = match cap.get(2) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            };
            Some(Marker { page, ordinal })
        })
        .collect()
}

/// Validate a generated answer against the evidence it was grounded on.
///
/// Returns the final answer text and the citations that survived. The
/// refusal literal comes back exact (the model's phrasing is normalized),
/// with no citations.
pub fn validate_answer(answer: &str, evidence: &Evidence) -> (String, Vec<Citation>) {
    let trimmed = answer.trim();

    // A refusal in any phrasing normalizes to the exact literal
    if trimmed.to_lowercase().contains("not found in the document") {
        return (REFUSAL.to_string(), Vec::new());
    }

    let mut citations: Vec<Citation> = Vec::new();
    for marker in parse_markers(trimmed) {
        let resolved = match marker.ordinal {
            Some(ordinal) => evidence
                .by_chunk_id(&ChunkId::new(marker.page, ordinal))
                .map(|hit| Citation {
                    page: hit.chunk.page_number,
                    chunk_id: hit.chunk.id.clone(),
                }),
            // Page-granular markers resolve to the best-ranked chunk on
            // that page
            None => evidence.best_on_page(marker.page).map(|hit| Citation {
                page: hit.chunk.page_number,
                chunk_id: hit.chunk.id.clone(),
            }),
        };

        match resolved {
            Some(citation) => {
                if !citations.contains(&citation) {
                    citations.push(citation);
                }
            }
            None => {
                tracing::warn!(
                    page = marker.page,
                    ordinal = ?marker.ordinal,
                    "citation marker not backed by evidence; dropped"
                );
            }
        }
    }

    if citations.is_empty() {
        // No grounded claim survived: fail closed, never fail open
        tracing::warn!("answer carried no valid citations; downgraded to refusal");
        return (REFUSAL.to_string(), Vec::new());
    }

    (trimmed.to_string(), citations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::evidence_from_hits;
    use crate::types::Chunk;

    fn evidence() -> Evidence {
        evidence_from_hits(vec![
            (
                Chunk::new(2, 0, "Total consolidated income for H1-26 was $412M.", (0, 46)),
                0.9,
            ),
            (Chunk::new(2, 1, "Margins improved year over year.", (0, 32)), 0.8),
            (Chunk::new(5, 0, "Cargo volumes were flat.", (0, 24)), 0.6),
        ])
    }

    #[test]
    fn parses_both_marker_forms() {
        let markers = parse_markers("Income was $412M [p2:c0] and margins rose [p2].");
        assert_eq!(
            markers,
            vec![
                Marker { page: 2, ordinal: Some(0) },
                Marker { page: 2, ordinal: None },
            ]
        );
    }

    #[test]
    fn chunk_granular_citation_resolves_exactly() {
        let (answer, citations) =
            validate_answer("Income was $412M [p2:c0].", &evidence());
        assert_eq!(answer, "Income was $412M [p2:c0].");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].chunk_id, ChunkId::new(2, 0));
        assert_eq!(citations[0].page, 2);
    }

    #[test]
    fn page_granular_citation_resolves_to_best_chunk_on_page() {
        let (_, citations) = validate_answer("Margins improved [p2].", &evidence());
        assert_eq!(citations.len(), 1);
        // Best-ranked chunk on page 2 is p2-c0
        assert_eq!(citations[0].chunk_id, ChunkId::new(2, 0));
    }

    #[test]
    fn unbacked_markers_are_dropped_not_trusted() {
        let (answer, citations) = validate_answer(
            "Income was $412M [p2:c0], and the CEO said so [p9:c3].",
            &evidence(),
        );
        assert!(answer.contains("$412M"));
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].chunk_id, ChunkId::new(2, 0));
    }

    #[test]
    fn answer_without_citations_is_downgraded_to_refusal() {
        let (answer, citations) =
            validate_answer("The income was definitely around $400M.", &evidence());
        assert_eq!(answer, REFUSAL);
        assert!(citations.is_empty());
    }

    #[test]
    fn answer_with_only_invalid_citations_is_downgraded() {
        let (answer, citations) = validate_answer("It was $5 [p99].", &evidence());
        assert_eq!(answer, REFUSAL);
        assert!(citations.is_empty());
    }

    #[test]
    fn model_refusal_normalizes_to_exact_literal() {
        let (answer, citations) = validate_answer(
            "**Answer:** not found in the document, sorry!",
            &evidence(),
        );
        assert_eq!(answer, REFUSAL);
        assert!(citations.is_empty());
    }

    #[test]
    fn repeated_markers_cite_once() {
        let (_, citations) =
            validate_answer("$412M [p2:c0], again [p2:c0], and [p5:c0].", &evidence());
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].chunk_id, ChunkId::new(2, 0));
        assert_eq!(citations[1].chunk_id, ChunkId::new(5, 0));
    }
}
