//! Knowledge base registry repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::{KnowledgeBase, KnowledgeBaseDocument};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistence for knowledge base and document metadata
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KnowledgeBaseRepository: Send + Sync + Debug {
    /// Finds a knowledge base by its unique name
    async fn get(&self, name: &str) -> Result<Option<KnowledgeBase>, DomainError>;

    /// Lists all knowledge bases, newest first
    async fn list(&self) -> Result<Vec<KnowledgeBase>, DomainError>;

    /// Registers a new knowledge base; `Conflict` if the name is taken
    async fn create(&self, knowledge_base: KnowledgeBase) -> Result<KnowledgeBase, DomainError>;

    /// Records an ingested document and bumps the owning KB's counters
    async fn record_document(
        &self,
        document: KnowledgeBaseDocument,
    ) -> Result<KnowledgeBase, DomainError>;

    /// Drops every document row of a KB and zeroes its counters.
    ///
    /// Used when the KB's index had to be rebuilt from scratch.
    async fn reset_documents(&self, kb_name: &str) -> Result<KnowledgeBase, DomainError>;

    /// Lists documents of a knowledge base, newest first
    async fn list_documents(&self, kb_name: &str)
        -> Result<Vec<KnowledgeBaseDocument>, DomainError>;
}
