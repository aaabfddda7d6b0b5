//! Pipeline façade wiring providers, index, retriever, and engine
//!
//! The single entry point a thin CLI or HTTP layer builds on: ingest a
//! document once, then open sessions against it.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::GroundingEngine;
use crate::index::{IndexManager, IndexSummary};
use crate::providers::{
    EmbeddingProvider, GenerationProvider, MemoryVectorStore, OllamaClient, OllamaEmbedder,
    OllamaGenerator, VectorStoreProvider,
};
use crate::retrieval::Retriever;
use crate::session::Session;
use crate::types::Page;

/// A fully wired grounded Q&A pipeline for one document
pub struct RagPipeline {
    config: RagConfig,
    index: Arc<IndexManager>,
    retriever: Arc<Retriever>,
    engine: Arc<GroundingEngine>,
}

impl RagPipeline {
    /// Wire a pipeline from explicit providers
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let index = Arc::new(IndexManager::new(
            Arc::clone(&embedder),
            store,
            config.index.dir.clone(),
            config.chunking.clone(),
        )?);
        let retriever = Arc::new(Retriever::new(
            Arc::clone(&index),
            embedder,
            config.retrieval.clone(),
        ));
        let engine = Arc::new(GroundingEngine::new(
            generator,
            Duration::from_millis(config.llm.retry_backoff_ms),
            config.llm.max_history_turns,
        ));

        Ok(Self {
            config,
            index,
            retriever,
            engine,
        })
    }

    /// Wire a pipeline against a local Ollama server, with the bundled
    /// cosine store snapshotted under the configured index directory
    pub fn with_ollama(config: RagConfig, dimensions: usize) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(&config.llm)?);
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OllamaEmbedder::new(Arc::clone(&client), dimensions));
        let generator: Arc<dyn GenerationProvider> = Arc::new(OllamaGenerator::new(
            client,
            config.llm.generate_model.clone(),
        ));
        let store: Arc<dyn VectorStoreProvider> = Arc::new(MemoryVectorStore::open(
            config.index.dir.join("records.json"),
        )?);
        Self::new(config, embedder, generator, store)
    }

    /// Ingest the document: reuse the persisted index when the fingerprint
    /// matches, rebuild otherwise
    pub async fn ingest(&self, pages: &[Page]) -> Result<IndexSummary> {
        self.index.ensure_index(pages).await
    }

    /// Open a new conversation against the ingested document
    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.retriever), Arc::clone(&self.engine))
    }

    /// The active configuration
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkingConfig, IndexConfig, RetrievalConfig};
    use crate::generation::REFUSAL;
    use crate::test_util::{FakeEmbedder, FakeGenerator};
    use crate::types::ChunkId;

    fn pages() -> Vec<Page> {
        vec![
            Page::new(1, "The annual report covers revenue and operations."),
            Page::new(2, "Total consolidated income for H1-26 was $412M."),
            Page::new(3, "Forward-looking statements and legal disclaimers."),
        ]
    }

    fn pipeline_with(
        dir: &std::path::Path,
        generator: Arc<FakeGenerator>,
    ) -> (RagPipeline, Arc<FakeEmbedder>) {
        let config = RagConfig {
            chunking: ChunkingConfig {
                chunk_size: 500,
                overlap: 50,
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                min_score: 0.3,
            },
            index: IndexConfig {
                dir: dir.to_path_buf(),
            },
            ..Default::default()
        };
        let embedder = Arc::new(FakeEmbedder::new(64));
        let pipeline = RagPipeline::new(
            config,
            Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
            generator as Arc<dyn GenerationProvider>,
            Arc::new(MemoryVectorStore::ephemeral()),
        )
        .unwrap();
        (pipeline, embedder)
    }

    #[tokio::test]
    async fn grounded_and_refused_questions_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(FakeGenerator::scripted(vec![Ok(
            "The consolidated total income in H1-26 was $412M [p2:c0].".to_string(),
        )]));
        let (pipeline, _) = pipeline_with(dir.path(), Arc::clone(&generator));

        // Short pages: one chunk per page at 500/50
        let summary = pipeline.ingest(&pages()).await.unwrap();
        assert_eq!(summary.chunk_count, 3);

        let mut session = pipeline.session();

        // Grounded numeric question: page 2 chunk is rank 1 and cited
        let (turn, grounded) = session
            .ask_with_trace("What is the consolidated total income in H1-26?")
            .await
            .unwrap();
        assert!(turn.text.contains("$412M"));
        assert_eq!(grounded.retrieved[0].rank, 1);
        assert_eq!(grounded.retrieved[0].page, 2);
        assert_eq!(grounded.citations.len(), 1);
        assert_eq!(grounded.citations[0].page, 2);
        assert_eq!(grounded.citations[0].chunk_id, ChunkId::new(2, 0));

        // Negative control: nothing about this in the document
        let (turn, grounded) = session
            .ask_with_trace("What is the CEO's email address?")
            .await
            .unwrap();
        assert_eq!(turn.text, REFUSAL);
        assert!(grounded.citations.is_empty());
        assert!(grounded.retrieved.is_empty());

        // The refused question never reached the generator
        assert_eq!(generator.calls(), 1);
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn reingesting_an_unchanged_document_reuses_the_index() {
        let dir = tempfile::tempdir().unwrap();

        let config = RagConfig {
            index: IndexConfig {
                dir: dir.path().to_path_buf(),
            },
            ..Default::default()
        };
        let embedder = Arc::new(FakeEmbedder::new(64));
        let store: Arc<dyn VectorStoreProvider> = Arc::new(
            MemoryVectorStore::open(dir.path().join("records.json")).unwrap(),
        );
        let pipeline = RagPipeline::new(
            config,
            Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
            Arc::new(FakeGenerator::scripted(vec![])) as Arc<dyn GenerationProvider>,
            store,
        )
        .unwrap();

        let first = pipeline.ingest(&pages()).await.unwrap();
        assert!(!first.reused);
        let calls_after_build = embedder.calls();

        let second = pipeline.ingest(&pages()).await.unwrap();
        assert!(second.reused);
        assert_eq!(embedder.calls(), calls_after_build);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_at_wiring_time() {
        let config = RagConfig {
            chunking: ChunkingConfig {
                chunk_size: 100,
                overlap: 200,
            },
            ..Default::default()
        };
        let result = RagPipeline::new(
            config,
            Arc::new(FakeEmbedder::new(8)) as Arc<dyn EmbeddingProvider>,
            Arc::new(FakeGenerator::scripted(vec![])) as Arc<dyn GenerationProvider>,
            Arc::new(MemoryVectorStore::ephemeral()),
        );
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
