//! Chunking strategy implementations

mod fixed_size;
mod recursive;
mod semantic;

pub use fixed_size::FixedSizeChunker;
pub use recursive::RecursiveChunker;
pub use semantic::SemanticChunker;
