//! In-process vector store with cosine similarity and a JSON snapshot
//!
//! Plays the local-backend role: good for one document's worth of chunks,
//! scanned linearly at query time. The snapshot file makes upserts durable
//! so a fingerprint-matched index can be reopened without re-embedding.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::vector_store::{IndexRecord, VectorHit, VectorStoreProvider};

/// Brute-force cosine store, optionally snapshotted to disk
pub struct MemoryVectorStore {
    records: RwLock<Vec<IndexRecord>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryVectorStore {
    /// Create an ephemeral store with no snapshot file
    pub fn ephemeral() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by `path`, loading the snapshot if one exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };
        Ok(Self {
            records: RwLock::new(records),
            snapshot_path: Some(path),
        })
    }

    fn save_snapshot(&self, records: &[IndexRecord]) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(records)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStoreProvider for MemoryVectorStore {
    async fn upsert(&self, batch: &[IndexRecord]) -> Result<()> {
        for record in batch {
            if record.embedding.is_empty() {
                return Err(Error::vector_store(format!(
                    "record {} has an empty embedding",
                    record.chunk_id
                )));
            }
        }

        let mut records = self.records.write();
        for record in batch {
            match records.iter().position(|r| r.chunk_id == record.chunk_id) {
                Some(pos) => records[pos] = record.clone(),
                None => records.push(record.clone()),
            }
        }
        self.save_snapshot(&records)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let records = self.records.read();
        let mut hits: Vec<VectorHit> = records
            .iter()
            .map(|r| VectorHit {
                chunk_id: r.chunk_id.clone(),
                score: cosine(query, &r.embedding),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    async fn clear(&self) -> Result<()> {
        let mut records = self.records.write();
        records.clear();
        self.save_snapshot(&records)
    }

    fn name(&self) -> &str {
        "memory-cosine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkId;

    fn record(page: u32, ordinal: u32, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            chunk_id: ChunkId::new(page, ordinal),
            embedding,
            page_number: page,
            ordinal,
        }
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let store = MemoryVectorStore::ephemeral();
        store
            .upsert(&[
                record(1, 0, vec![1.0, 0.0]),
                record(2, 0, vec![0.0, 1.0]),
                record(3, 0, vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, ChunkId::new(1, 0));
        assert_eq!(hits[1].chunk_id, ChunkId::new(3, 0));
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_record() {
        let store = MemoryVectorStore::ephemeral();
        store.upsert(&[record(1, 0, vec![1.0, 0.0])]).await.unwrap();
        store.upsert(&[record(1, 0, vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        let hits = store.search(&[0.0, 1.0], 1).await.unwrap();
        assert!(hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn empty_embedding_rejected() {
        let store = MemoryVectorStore::ephemeral();
        let result = store.upsert(&[record(1, 0, vec![])]).await;
        assert!(matches!(result, Err(Error::VectorStore(_))));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        {
            let store = MemoryVectorStore::open(&path).unwrap();
            store
                .upsert(&[record(1, 0, vec![1.0, 0.0]), record(1, 1, vec![0.0, 1.0])])
                .await
                .unwrap();
        }

        let reopened = MemoryVectorStore::open(&path).unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
