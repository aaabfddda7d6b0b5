//! Provider abstractions for embeddings, generation, and vector storage
//!
//! Trait-based seams so the pipeline can run against a local Ollama server
//! or against in-process fakes in tests.

pub mod embedding;
pub mod generation;
pub mod memory;
pub mod ollama;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use generation::GenerationProvider;
pub use memory::MemoryVectorStore;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};
pub use vector_store::{IndexRecord, VectorHit, VectorStoreProvider};
