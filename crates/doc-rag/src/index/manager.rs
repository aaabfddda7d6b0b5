//! Index lifecycle: fingerprint-gated reuse, atomic rebuild, clamped search
//!
//! The manager is the sole writer of index records and of the on-disk
//! layout (`manifest.json` + `catalog.json` next to the store's own
//! snapshot). Rebuild deletes the manifest first and re-writes it last, so
//! a crash mid-rebuild leaves no valid fingerprint behind and the next run
//! rebuilds from scratch rather than serving a half-populated index.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::ingestion::chunk_pages;
use crate::providers::{EmbeddingProvider, IndexRecord, VectorHit, VectorStoreProvider};
use crate::types::{Chunk, ChunkId, Page};

use super::fingerprint::IndexFingerprint;

const MANIFEST_FILE: &str = "manifest.json";
const CATALOG_FILE: &str = "catalog.json";

/// Persisted alongside the index; its presence with a matching fingerprint
/// is what authorizes the reuse path
#[derive(Debug, Serialize, Deserialize)]
struct IndexManifest {
    fingerprint: String,
    chunk_count: usize,
    built_at: DateTime<Utc>,
}

/// Chunk-id lookup for an open index
struct Catalog {
    chunks: Vec<Chunk>,
    by_id: HashMap<ChunkId, usize>,
}

impl Catalog {
    fn new(chunks: Vec<Chunk>) -> Self {
        let by_id = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self { chunks, by_id }
    }

    fn get(&self, id: &ChunkId) -> Option<&Chunk> {
        self.by_id.get(id).map(|&i| &self.chunks[i])
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

enum IndexState {
    /// `ensure_index` has not completed yet
    Empty,
    /// A rebuild is in flight; queries must not be served
    Building,
    /// Open and queryable
    Ready(Arc<Catalog>),
}

/// Outcome of `ensure_index`
#[derive(Debug, Clone)]
pub struct IndexSummary {
    /// True when the persisted index was opened without re-embedding
    pub reused: bool,
    /// Number of chunks in the index
    pub chunk_count: usize,
    /// Hex fingerprint of the open index
    pub fingerprint: String,
}

/// Owns the vector store lifecycle for one document
pub struct IndexManager {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    dir: PathBuf,
    chunking: ChunkingConfig,
    state: RwLock<IndexState>,
}

impl IndexManager {
    /// Create a manager over the given providers and index directory
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        dir: PathBuf,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        chunking.validate()?;
        Ok(Self {
            embedder,
            store,
            dir,
            chunking,
            state: RwLock::new(IndexState::Empty),
        })
    }

    /// Open the persisted index if its fingerprint matches, otherwise chunk,
    /// embed, and upsert everything from scratch.
    pub async fn ensure_index(&self, pages: &[Page]) -> Result<IndexSummary> {
        let fingerprint = IndexFingerprint::compute(pages, &self.chunking);

        if let Some(summary) = self.try_reuse(&fingerprint).await? {
            tracing::info!(
                chunks = summary.chunk_count,
                "index fingerprint matched; reusing persisted index"
            );
            return Ok(summary);
        }

        tracing::info!("index fingerprint missing or stale; rebuilding");
        *self.state.write() = IndexState::Building;

        match self.rebuild(pages, &fingerprint).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                // Leave no half-index behind: queries keep failing with
                // IndexNotReady until a later rebuild succeeds.
                *self.state.write() = IndexState::Empty;
                Err(e)
            }
        }
    }

    /// Similarity search against the open index. `k` is clamped to
    /// `[1, chunk_count]`; oversized requests are not errors.
    pub async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let catalog = self.ready_catalog()?;
        if catalog.len() == 0 {
            return Ok(Vec::new());
        }
        let k = k.max(1).min(catalog.len());
        self.store.search(vector, k).await
    }

    /// Look up a chunk by id in the open index
    pub fn chunk(&self, id: &ChunkId) -> Option<Chunk> {
        match &*self.state.read() {
            IndexState::Ready(catalog) => catalog.get(id).cloned(),
            _ => None,
        }
    }

    /// Number of chunks in the open index, or an `IndexNotReady` error
    /// while a rebuild is in flight
    pub fn chunk_count(&self) -> Result<usize> {
        Ok(self.ready_catalog()?.len())
    }

    fn ready_catalog(&self) -> Result<Arc<Catalog>> {
        match &*self.state.read() {
            IndexState::Ready(catalog) => Ok(Arc::clone(catalog)),
            _ => Err(Error::IndexNotReady),
        }
    }

    async fn try_reuse(&self, fingerprint: &IndexFingerprint) -> Result<Option<IndexSummary>> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(None);
        }

        let manifest: IndexManifest =
            match serde_json::from_str(&std::fs::read_to_string(&manifest_path)?) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("unreadable index manifest ({}); rebuilding", e);
                    return Ok(None);
                }
            };

        if manifest.fingerprint != fingerprint.as_hex() {
            return Ok(None);
        }

        let catalog_path = self.dir.join(CATALOG_FILE);
        if !catalog_path.exists() {
            tracing::warn!("manifest present but chunk catalog missing; rebuilding");
            return Ok(None);
        }
        let chunks: Vec<Chunk> =
            match serde_json::from_str(&std::fs::read_to_string(&catalog_path)?) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("unreadable chunk catalog ({}); rebuilding", e);
                    return Ok(None);
                }
            };

        let stored = self.store.len().await?;
        if stored != manifest.chunk_count || chunks.len() != manifest.chunk_count {
            tracing::warn!(
                stored,
                expected = manifest.chunk_count,
                "store/catalog out of step with manifest; rebuilding"
            );
            return Ok(None);
        }

        let count = chunks.len();
        *self.state.write() = IndexState::Ready(Arc::new(Catalog::new(chunks)));
        Ok(Some(IndexSummary {
            reused: true,
            chunk_count: count,
            fingerprint: manifest.fingerprint,
        }))
    }

    async fn rebuild(&self, pages: &[Page], fingerprint: &IndexFingerprint) -> Result<IndexSummary> {
        std::fs::create_dir_all(&self.dir)?;

        // Invalidate first: until the new manifest lands, this index does
        // not exist as far as the reuse path is concerned.
        let manifest_path = self.dir.join(MANIFEST_FILE);
        if manifest_path.exists() {
            std::fs::remove_file(&manifest_path)?;
        }
        self.store.clear().await?;

        let chunks = chunk_pages(pages, &self.chunking)?;

        if !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let records: Vec<IndexRecord> = chunks
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexRecord {
                    chunk_id: chunk.id.clone(),
                    embedding,
                    page_number: chunk.page_number,
                    ordinal: chunk.ordinal,
                })
                .collect();
            self.store.upsert(&records).await?;
        }

        self.write_json(CATALOG_FILE, &chunks)?;
        self.write_json(
            MANIFEST_FILE,
            &IndexManifest {
                fingerprint: fingerprint.as_hex().to_string(),
                chunk_count: chunks.len(),
                built_at: Utc::now(),
            },
        )?;

        let count = chunks.len();
        tracing::info!(chunks = count, "index rebuilt");
        *self.state.write() = IndexState::Ready(Arc::new(Catalog::new(chunks)));
        Ok(IndexSummary {
            reused: false,
            chunk_count: count,
            fingerprint: fingerprint.as_hex().to_string(),
        })
    }

    /// Write via temp file + rename so readers never see a torn file
    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
