//! Deterministic windowed chunking with page and position tracking
//!
//! Splitting proceeds independently per page, in page order. Within a page
//! the window advances by `chunk_size - overlap` characters, so consecutive
//! chunks share at most `overlap` characters and the final chunk may be
//! shorter than `chunk_size`. Identical input always yields byte-identical
//! chunks and ids; the index fingerprint depends on it.

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Page};

/// Chunk all pages, in page order
pub fn chunk_pages(pages: &[Page], config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    config.validate()?;
    let step = config.chunk_size - config.overlap;

    let mut chunks = Vec::new();
    for page in pages {
        chunk_page(page, config.chunk_size, step, &mut chunks);
    }

    tracing::debug!(
        pages = pages.len(),
        chunks = chunks.len(),
        "chunked document"
    );
    Ok(chunks)
}

/// Chunk a single page. Windows are measured in characters and spans are
/// snapped to UTF-8 boundaries by construction.
fn chunk_page(page: &Page, size: usize, step: usize, out: &mut Vec<Chunk>) {
    if page.text.trim().is_empty() {
        // An empty page yields zero chunks, not an error
        return;
    }

    // Byte offset of every char boundary, including the end of the text
    let boundaries: Vec<usize> = page
        .text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(page.text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let mut ordinal = 0u32;
    let mut start = 0usize;
    while start < char_count {
        let end = (start + size).min(char_count);
        let span = (boundaries[start], boundaries[end]);
        let text = &page.text[span.0..span.1];
        out.push(Chunk::new(page.number, ordinal, text, span));
        ordinal += 1;
        if end == char_count {
            break;
        }
        start += step;
    }
}
