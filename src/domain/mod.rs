//! Domain layer - core types, traits and pure logic

pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod knowledge_base;
pub mod llm;
pub mod retrieval;
pub mod synthesis;
pub mod vector_index;

pub use embedding::{
    EmbeddingFamily, EmbeddingModel, EmbeddingProvider, EmbeddingProviderResolver,
    EmbeddingRequest, EmbeddingResponse, ProviderKind,
};
pub use error::DomainError;
pub use ingestion::{
    Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy, ChunkingStrategyKind, DocumentParser,
    DocumentType, IngestError, IngestReport, IngestRequest, IngestResult, PageText,
};
pub use knowledge_base::{
    KnowledgeBase, KnowledgeBaseDocument, KnowledgeBaseName, KnowledgeBaseRepository,
};
pub use llm::{LlmProvider, LlmProviderResolver, LlmRequest, LlmResponse, Message, MessageRole};
pub use retrieval::{rank_hits, similarity, KbRetrieval, RetrievalHit, SkipReason};
pub use synthesis::{AnswerStatus, KbAnswer, QueryResponse, Source, SynthesizedAnswer};
pub use vector_index::{IndexEntry, VectorIndex, VectorIndexStore};
