//! doc-rag: single-document grounded question answering
//!
//! Answers natural-language questions strictly from one ingested document.
//! Pages are chunked deterministically, embedded into a fingerprint-gated
//! vector index, retrieved as ranked evidence, and answered through a
//! grounding engine that validates citations and refuses when the document
//! lacks the information. Conversations are append-only turn transcripts.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::{GroundingEngine, REFUSAL};
pub use index::{IndexFingerprint, IndexManager, IndexSummary};
pub use pipeline::RagPipeline;
pub use retrieval::{Evidence, Retriever, ScoredChunk};
pub use session::Session;
pub use types::{
    Chunk, ChunkId, Citation, GroundedAnswer, Page, RetrievedRef, Role, Turn,
};
