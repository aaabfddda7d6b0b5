//! Content fingerprint gating index reuse vs rebuild

use sha2::{Digest, Sha256};

use crate::config::ChunkingConfig;
use crate::types::Page;

/// SHA-256 over the document content and the chunking parameters.
///
/// A persisted index is only reused when a freshly computed fingerprint
/// matches the one stored beside it; any change to a page's text or to the
/// chunking parameters produces a different fingerprint and forces a full
/// rebuild, so two chunking schemes can never mix in one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFingerprint(String);

impl IndexFingerprint {
    /// Compute the fingerprint for a document and its chunking parameters
    pub fn compute(pages: &[Page], chunking: &ChunkingConfig) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((chunking.chunk_size as u64).to_le_bytes());
        hasher.update((chunking.overlap as u64).to_le_bytes());
        hasher.update((pages.len() as u64).to_le_bytes());
        for page in pages {
            hasher.update(page.number.to_le_bytes());
            hasher.update((page.text.len() as u64).to_le_bytes());
            hasher.update(page.text.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Hex-encoded digest
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}
