//! Core types shared across the pipeline

pub mod document;
pub mod response;
pub mod turn;

pub use document::{Chunk, ChunkId, Page};
pub use response::{Citation, GroundedAnswer, RetrievedRef};
pub use turn::{Role, Turn};
