//! Prompt templates for grounded generation
//!
//! Assembly is a pure function of question, evidence, and history: no
//! hidden state, testable without a live generation call.

use crate::retrieval::Evidence;
use crate::types::Turn;

use super::REFUSAL;

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the full generation prompt.
    ///
    /// Each retrieved chunk is tagged with its `[p<page>:c<ordinal>]`
    /// marker; the instructions pin the model to the supplied chunks, to
    /// the chunk-granular citation form, and to the exact refusal literal.
    pub fn build(
        question: &str,
        evidence: &Evidence,
        history: &[Turn],
        max_history_turns: usize,
    ) -> String {
        format!(
            r#"You are a helpful assistant that answers questions based ONLY on the provided document context.

CRITICAL RULES:
1. ONLY use information from the provided context chunks to answer
2. If the answer is NOT in the context, respond EXACTLY with: "{refusal}"
3. NEVER make up or hallucinate information
4. Cite every factual claim with a marker in the form [p<page>:c<chunk>], e.g. [p2:c0]
5. For numeric questions, only provide numbers that appear verbatim in the context
6. Cite the specific chunk(s) that support each part of your answer
{history}
CONTEXT FROM DOCUMENT:
{context}

USER QUESTION: {question}

Answer using only the context above:"#,
            refusal = REFUSAL,
            history = Self::format_history(history, max_history_turns),
            context = Self::build_context(evidence),
            question = question,
        )
    }

    /// Render the evidence chunks, each prefixed with its citation tag
    pub fn build_context(evidence: &Evidence) -> String {
        let mut context = String::new();
        for hit in evidence.hits() {
            context.push_str(&format!(
                "{}\n{}\n\n---\n\n",
                hit.chunk.citation_tag(),
                hit.chunk.text
            ));
        }
        context
    }

    /// Render the most recent turns, oldest first. Truncation happens here,
    /// never by mutating the session's history.
    fn format_history(history: &[Turn], max_turns: usize) -> String {
        if history.is_empty() || max_turns == 0 {
            return String::new();
        }

        let start = history.len().saturating_sub(max_turns);
        let mut rendered = String::from("\nCONVERSATION SO FAR:\n");
        for turn in &history[start..] {
            rendered.push_str(&format!("{}: {}\n", turn.role.as_str(), turn.text));
        }
        rendered
    }
}
