//! Error types for the grounded Q&A pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid chunking or search parameters. Fatal, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query arrived while the index was being rebuilt. Callers should
    /// back off and retry; the index is never served half-populated.
    #[error("Index is not ready; a rebuild is in progress")]
    IndexNotReady,

    /// The generation backend failed even after a retry. Distinct from the
    /// refusal answer: refusal means "no evidence", this means "service down".
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Single generation attempt failed (retried once by the engine)
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Embedding generation failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector store error
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore(message.into())
    }

    /// Create a single-attempt generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }
}
