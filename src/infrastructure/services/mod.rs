//! Infrastructure services

mod ingestion_service;
mod knowledge_base_service;
mod query_engine;
mod retrieval_service;
mod vector_index_service;

pub use ingestion_service::IngestionService;
pub use knowledge_base_service::KnowledgeBaseService;
pub use query_engine::{QueryEngine, QueryError, QueryRequest};
pub use retrieval_service::RetrievalService;
pub use vector_index_service::{LoadedIndex, VectorIndexService};
