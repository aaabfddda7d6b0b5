//! Document ingestion: turning extracted pages into retrievable chunks

pub mod chunker;

pub use chunker::chunk_pages;
