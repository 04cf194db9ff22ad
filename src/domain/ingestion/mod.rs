//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `DocumentParser` trait for extracting page text from uploads
//! - `ChunkingStrategy` trait for splitting pages into chunks
//! - Request, result and error types for the ingestion pipeline

pub mod chunker;
pub mod document;
pub mod parser;
pub mod pipeline;

pub use chunker::{Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy, ChunkingStrategyKind};
pub use document::{DocumentType, PageText};
pub use parser::DocumentParser;
pub use pipeline::{IngestError, IngestReport, IngestRequest, IngestResult};

#[cfg(test)]
pub use parser::mock::MockDocumentParser;
