//! In-memory knowledge base registry

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::knowledge_base::{
    KnowledgeBase, KnowledgeBaseDocument, KnowledgeBaseRepository,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Registry {
    knowledge_bases: HashMap<String, KnowledgeBase>,
    documents: Vec<KnowledgeBaseDocument>,
}

/// Thread-safe in-memory registry
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeBaseRepository {
    registry: RwLock<Registry>,
}

impl InMemoryKnowledgeBaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Registry>, DomainError> {
        self.registry
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Registry>, DomainError> {
        self.registry
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl KnowledgeBaseRepository for InMemoryKnowledgeBaseRepository {
    async fn get(&self, name: &str) -> Result<Option<KnowledgeBase>, DomainError> {
        Ok(self.read()?.knowledge_bases.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<KnowledgeBase>, DomainError> {
        let mut knowledge_bases: Vec<KnowledgeBase> =
            self.read()?.knowledge_bases.values().cloned().collect();
        knowledge_bases.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(knowledge_bases)
    }

    async fn create(&self, knowledge_base: KnowledgeBase) -> Result<KnowledgeBase, DomainError> {
        let mut registry = self.write()?;
        let name = knowledge_base.name().as_str().to_string();

        if registry.knowledge_bases.contains_key(&name) {
            return Err(DomainError::conflict(format!(
                "Knowledge base '{}' already exists",
                name
            )));
        }

        registry.knowledge_bases.insert(name, knowledge_base.clone());

        Ok(knowledge_base)
    }

    async fn record_document(
        &self,
        document: KnowledgeBaseDocument,
    ) -> Result<KnowledgeBase, DomainError> {
        let mut registry = self.write()?;

        let knowledge_base = registry
            .knowledge_bases
            .get_mut(document.kb_name.as_str())
            .ok_or_else(|| {
                DomainError::not_found(format!("Knowledge base '{}' not found", document.kb_name))
            })?;
        knowledge_base.record_document(document.chunk_count as usize);
        let updated = knowledge_base.clone();

        registry.documents.push(document);

        Ok(updated)
    }

    async fn reset_documents(&self, kb_name: &str) -> Result<KnowledgeBase, DomainError> {
        let mut registry = self.write()?;

        let knowledge_base = registry.knowledge_bases.get_mut(kb_name).ok_or_else(|| {
            DomainError::not_found(format!("Knowledge base '{}' not found", kb_name))
        })?;
        knowledge_base.clear_documents();
        let updated = knowledge_base.clone();

        registry.documents.retain(|d| d.kb_name.as_str() != kb_name);

        Ok(updated)
    }

    async fn list_documents(
        &self,
        kb_name: &str,
    ) -> Result<Vec<KnowledgeBaseDocument>, DomainError> {
        let mut documents: Vec<KnowledgeBaseDocument> = self
            .read()?
            .documents
            .iter()
            .filter(|d| d.kb_name.as_str() == kb_name)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(documents)
    }
}
