//! In-memory representation of one (family, KB) vector index

use serde::{Deserialize, Serialize};

use crate::domain::embedding::{EmbeddingFamily, EmbeddingModel};
use crate::domain::ingestion::Chunk;
use crate::domain::knowledge_base::KnowledgeBaseName;
use crate::domain::DomainError;

/// A chunk together with its embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}

/// Squared Euclidean distance; lower means closer
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Exact nearest-neighbour index over the chunks of one knowledge base.
///
/// Entries are append-only and share one dimensionality, fixed by the first
/// batch.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    kb_name: KnowledgeBaseName,
    family: EmbeddingFamily,
    embedding_model: String,
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index; dimensionality is taken from the first append
    pub fn new(kb_name: KnowledgeBaseName, model: &EmbeddingModel) -> Self {
        Self {
            kb_name,
            family: model.family().clone(),
            embedding_model: model.id().to_string(),
            dimensions: 0,
            entries: Vec::new(),
        }
    }

    /// Rebuild an index from persisted parts, checking vector shapes
    pub fn from_parts(
        kb_name: KnowledgeBaseName,
        family: EmbeddingFamily,
        embedding_model: String,
        dimensions: usize,
        entries: Vec<IndexEntry>,
    ) -> Result<Self, DomainError> {
        if let Some(bad) = entries.iter().position(|e| e.vector.len() != dimensions) {
            return Err(DomainError::internal(format!(
                "Entry {} has {} dimensions, index expects {}",
                bad,
                entries[bad].vector.len(),
                dimensions
            )));
        }

        Ok(Self {
            kb_name,
            family,
            embedding_model,
            dimensions,
            entries,
        })
    }

    pub fn kb_name(&self) -> &KnowledgeBaseName {
        &self.kb_name
    }

    pub fn family(&self) -> &EmbeddingFamily {
        &self.family
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append entries; all vectors must match the index dimensionality
    pub fn append(&mut self, entries: Vec<IndexEntry>) -> Result<(), DomainError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };

        let dimensions = if self.dimensions == 0 {
            first.vector.len()
        } else {
            self.dimensions
        };

        if dimensions == 0 {
            return Err(DomainError::invalid_argument("Embedding vectors cannot be empty"));
        }

        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimensions) {
            return Err(DomainError::invalid_argument(format!(
                "Embedding has {} dimensions but index '{}' expects {}",
                bad.vector.len(),
                self.kb_name,
                dimensions
            )));
        }

        self.dimensions = dimensions;
        self.entries.extend(entries);
        Ok(())
    }

    /// The `k` nearest chunks to `query`, closest first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>, DomainError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions {
            return Err(DomainError::invalid_argument(format!(
                "Query has {} dimensions but index '{}' expects {}",
                query.len(),
                self.kb_name,
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, squared_l2(query, &e.vector)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| (self.entries[i].chunk.clone(), distance))
            .collect())
    }
}
