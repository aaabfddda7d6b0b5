//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ChunkId;

/// One stored record, one-to-one with a chunk. The index manager is the
/// sole writer of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Chunk this record embeds
    pub chunk_id: ChunkId,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// Page number, kept for store-side diagnostics
    pub page_number: u32,
    /// Per-page ordinal
    pub ordinal: u32,
}

/// A single similarity-search match
#[derive(Debug, Clone)]
pub struct VectorHit {
    /// Matched chunk id
    pub chunk_id: ChunkId,
    /// Similarity score; monotonically higher is more similar
    pub score: f32,
}

/// Trait for durable vector storage and similarity search
///
/// Upserts are durable once the call returns; readers may run concurrently
/// against a store that is not being written.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert or replace a batch of records
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()>;

    /// Search for the `k` most similar records, ranked by descending score
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>>;

    /// Total number of records stored
    async fn len(&self) -> Result<usize>;

    /// Check if the store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Remove all records
    async fn clear(&self) -> Result<()>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
