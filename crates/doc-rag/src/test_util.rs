//! Deterministic fake providers shared by the test modules

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, GenerationProvider};

/// Bag-of-tokens embedder: each token hashes into one of `dims` buckets and
/// the vector is L2-normalized. Deterministic, and similar texts land near
/// each other, which is all retrieval tests need.
pub(crate) struct FakeEmbedder {
    dims: usize,
    calls: AtomicUsize,
    fail: bool,
}

impl FakeEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// An embedder whose every call fails; for rebuild-abort tests
    pub fn failing(dims: usize) -> Self {
        Self {
            dims,
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of embedding calls observed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Embed without going through the async trait or the call counter;
    /// for building query vectors directly in tests
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(token.as_bytes()) as usize) % self.dims;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(Error::embedding("synthetic embedding failure"));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "fake-embedder"
    }
}

/// Scripted generator: pops one scripted outcome per call and records every
/// prompt it was handed
pub(crate) struct FakeGenerator {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn scripted(script: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of generation calls observed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerationProvider for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        match self.script.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(Error::generation(message)),
            None => Err(Error::generation("generator script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "fake-generator"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// FNV-1a, fixed keys so embeddings are stable across runs
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
