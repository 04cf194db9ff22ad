//! Vector index persistence trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::VectorIndex;
use crate::domain::embedding::EmbeddingFamily;
use crate::domain::knowledge_base::KnowledgeBaseName;
use crate::domain::DomainError;

/// Durable storage of vector indexes, one per (family, KB)
#[async_trait]
pub trait VectorIndexStore: Send + Sync + Debug {
    /// Load an index.
    ///
    /// `IndexNotFound` when nothing usable exists at the location (missing,
    /// not a directory, or empty directory); `IndexCorrupt` when something
    /// exists but cannot be read back faithfully.
    async fn load(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<VectorIndex, DomainError>;

    /// Persist an index; readers never observe a partially written index
    async fn save(&self, index: &VectorIndex) -> Result<(), DomainError>;

    /// Remove an index and everything stored with it
    async fn remove(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<(), DomainError>;

    /// Whether an index is present (it may still turn out corrupt on load)
    async fn exists(
        &self,
        kb_name: &KnowledgeBaseName,
        family: &EmbeddingFamily,
    ) -> Result<bool, DomainError>;
}
