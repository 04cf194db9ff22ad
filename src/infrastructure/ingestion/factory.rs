//! Factory for creating parsers and chunkers

use std::sync::Arc;

use crate::domain::ingestion::{
    ChunkingConfig, ChunkingStrategy, ChunkingStrategyKind, DocumentParser, DocumentType,
};
use crate::domain::{DomainError, EmbeddingProvider};

use super::chunkers::{FixedSizeChunker, RecursiveChunker, SemanticChunker};
use super::parsers::{DocxParser, PdfParser};

/// Factory for creating document parsers
#[derive(Debug, Default)]
pub struct ParserFactory;

impl ParserFactory {
    pub fn create(document_type: DocumentType) -> Arc<dyn DocumentParser> {
        match document_type {
            DocumentType::Pdf => Arc::new(PdfParser::new()),
            DocumentType::Docx => Arc::new(DocxParser::new()),
        }
    }
}

/// Factory for creating chunking strategies
#[derive(Debug, Default)]
pub struct ChunkerFactory;

impl ChunkerFactory {
    /// Create a chunker; semantic strategies embed with `provider` and `model`
    pub fn create(
        kind: ChunkingStrategyKind,
        config: ChunkingConfig,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        model: &str,
    ) -> Result<Arc<dyn ChunkingStrategy>, DomainError> {
        let chunker: Arc<dyn ChunkingStrategy> = match kind {
            ChunkingStrategyKind::Fixed => Arc::new(FixedSizeChunker::new(config)?),
            ChunkingStrategyKind::Recursive => Arc::new(RecursiveChunker::new(config)?),
            ChunkingStrategyKind::SemanticPercentile
            | ChunkingStrategyKind::SemanticInterquartile
            | ChunkingStrategyKind::SemanticStdDev => {
                let provider = provider.ok_or_else(|| {
                    DomainError::internal(format!("{} chunking needs an embedding provider", kind))
                })?;
                Arc::new(SemanticChunker::new(kind, provider, model)?)
            }
        };

        Ok(chunker)
    }
}
