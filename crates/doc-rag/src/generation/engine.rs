//! Grounding engine: constrained generation with a fail-closed refusal path

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::GenerationProvider;
use crate::retrieval::Evidence;
use crate::types::{GroundedAnswer, Turn};

use super::citation::validate_answer;
use super::prompt::PromptBuilder;
use super::REFUSAL;

/// Builds the constrained prompt, invokes generation, and enforces the
/// citation and refusal policies
pub struct GroundingEngine {
    generator: Arc<dyn GenerationProvider>,
    retry_backoff: Duration,
    max_history_turns: usize,
}

impl GroundingEngine {
    /// Create an engine over a generation provider
    pub fn new(
        generator: Arc<dyn GenerationProvider>,
        retry_backoff: Duration,
        max_history_turns: usize,
    ) -> Self {
        Self {
            generator,
            retry_backoff,
            max_history_turns,
        }
    }

    /// Answer a question from its evidence.
    ///
    /// Empty evidence short-circuits to the refusal literal without any
    /// generation call, so the model never gets a chance to answer from
    /// parametric knowledge. The retrieval trace is attached to every
    /// outcome, grounded or refused.
    pub async fn answer(
        &self,
        question: &str,
        evidence: &Evidence,
        history: &[Turn],
    ) -> Result<GroundedAnswer> {
        let retrieved = evidence.to_refs();

        if evidence.is_empty() {
            tracing::info!("no evidence above threshold; refusing without generation");
            return Ok(GroundedAnswer {
                answer: REFUSAL.to_string(),
                citations: Vec::new(),
                retrieved,
            });
        }

        let prompt = PromptBuilder::build(question, evidence, history, self.max_history_turns);
        let raw = self.generate_with_retry(&prompt).await?;
        let (answer, citations) = validate_answer(&raw, evidence);

        Ok(GroundedAnswer {
            answer,
            citations,
            retrieved,
        })
    }

    /// One retry with backoff; a second failure surfaces as
    /// `GenerationUnavailable`, never as the refusal answer.
    async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        match self.generator.generate(prompt).await {
            Ok(text) => Ok(text),
            Err(first) => {
                tracing::warn!(error = %first, "generation failed; retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.generator
                    .generate(prompt)
                    .await
                    .map_err(|second| Error::GenerationUnavailable(second.to_string()))
            }
        }
    }
}
