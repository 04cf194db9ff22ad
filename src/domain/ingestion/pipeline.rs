//! Ingestion request and result types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ChunkingConfig;
use crate::domain::DomainError;

/// One uploaded file to ingest into a knowledge base
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub kb_name: String,
    pub embedding_model: String,
    pub chunking_strategy: String,
    pub chunking: ChunkingConfig,
}

impl IngestRequest {
    pub fn new(
        filename: impl Into<String>,
        bytes: Vec<u8>,
        kb_name: impl Into<String>,
        embedding_model: impl Into<String>,
        chunking_strategy: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            kb_name: kb_name.into(),
            embedding_model: embedding_model.into(),
            chunking_strategy: chunking_strategy.into(),
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunking = ChunkingConfig::new(chunk_size, chunk_overlap);
        self
    }
}

/// Outcome of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub filename: String,
    pub kb_name: String,
    pub page_count: usize,
    pub chunk_count: usize,
}

/// Ingestion failure with the context needed to diagnose it
#[derive(Debug, Error)]
#[error(
    "Failed to ingest '{filename}' into '{kb_name}' (embedding model '{embedding_model}', strategy '{chunking_strategy}'): {source}"
)]
pub struct IngestError {
    pub filename: String,
    pub kb_name: String,
    pub embedding_model: String,
    pub chunking_strategy: String,
    #[source]
    pub source: DomainError,
}

impl IngestError {
    pub fn new(request: &IngestRequest, source: DomainError) -> Self {
        Self {
            filename: request.filename.clone(),
            kb_name: request.kb_name.clone(),
            embedding_model: request.embedding_model.clone(),
            chunking_strategy: request.chunking_strategy.clone(),
            source,
        }
    }
}

/// Status payload handed to the calling layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IngestReport {
    Success {
        filename: String,
        page_count: usize,
        chunk_count: usize,
        kb_name: String,
    },
    Error {
        message: String,
    },
}

impl From<Result<IngestResult, IngestError>> for IngestReport {
    fn from(result: Result<IngestResult, IngestError>) -> Self {
        match result {
            Ok(r) => Self::Success {
                filename: r.filename,
                page_count: r.page_count,
                chunk_count: r.chunk_count,
                kb_name: r.kb_name,
            },
            Err(e) => Self::Error {
                message: e.to_string(),
            },
        }
    }
}
