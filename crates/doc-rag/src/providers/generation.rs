//! Generation provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM text generation
///
/// A single attempt: the grounding engine owns the retry policy, so
/// implementations must not retry internally.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// The model being used
    fn model(&self) -> &str;
}
