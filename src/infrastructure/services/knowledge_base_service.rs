//! Knowledge Base service - registry queries across registry and index store

use std::sync::Arc;

use super::VectorIndexService;
use crate::domain::{
    DomainError, EmbeddingModel, KnowledgeBase, KnowledgeBaseDocument, KnowledgeBaseName,
    KnowledgeBaseRepository,
};

/// Read access to registered knowledge bases
pub struct KnowledgeBaseService {
    repository: Arc<dyn KnowledgeBaseRepository>,
    indexes: Arc<VectorIndexService>,
}

impl std::fmt::Debug for KnowledgeBaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseService").finish()
    }
}

impl KnowledgeBaseService {
    pub fn new(
        repository: Arc<dyn KnowledgeBaseRepository>,
        indexes: Arc<VectorIndexService>,
    ) -> Self {
        Self {
            repository,
            indexes,
        }
    }

    /// Get a knowledge base by name
    pub async fn get(&self, name: &str) -> Result<Option<KnowledgeBase>, DomainError> {
        self.repository.get(name).await
    }

    /// Get a knowledge base by name, returning an error if not found
    pub async fn get_required(&self, name: &str) -> Result<KnowledgeBase, DomainError> {
        self.get(name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Knowledge base '{}' not found", name)))
    }

    /// List all knowledge bases, newest first
    pub async fn list(&self) -> Result<Vec<KnowledgeBase>, DomainError> {
        self.repository.list().await
    }

    /// Knowledge bases queryable with `embedding_model`: same family and an
    /// index present on disk
    pub async fn list_compatible(
        &self,
        embedding_model: &str,
    ) -> Result<Vec<KnowledgeBase>, DomainError> {
        let model = EmbeddingModel::parse(embedding_model)?;
        let mut compatible = Vec::new();

        for kb in self.repository.list().await? {
            if !kb.is_compatible_with(&model) {
                continue;
            }

            if self.indexes.exists(kb.name(), model.family()).await? {
                compatible.push(kb);
            }
        }

        Ok(compatible)
    }

    /// Documents of a knowledge base, newest first
    pub async fn list_documents(
        &self,
        kb_name: &str,
    ) -> Result<Vec<KnowledgeBaseDocument>, DomainError> {
        let name = KnowledgeBaseName::new(kb_name)?;
        self.get_required(name.as_str()).await?;
        self.repository.list_documents(name.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{MockEmbeddingProvider, StaticEmbeddingResolver};
    use crate::domain::vector_index::{MockVectorIndexStore, VectorIndex};
    use crate::domain::{ChunkingStrategyKind, DocumentType};
    use crate::infrastructure::knowledge_base::InMemoryKnowledgeBaseRepository;

    fn name(value: &str) -> KnowledgeBaseName {
        KnowledgeBaseName::new(value).unwrap()
    }

    async fn create_service(
        kbs: &[(&str, &str)],
        indexed: &[(&str, &str)],
    ) -> KnowledgeBaseService {
        let repository = Arc::new(InMemoryKnowledgeBaseRepository::new());
        for (kb, model) in kbs {
            repository
                .create(KnowledgeBase::new(name(kb), *model, ChunkingStrategyKind::Recursive))
                .await
                .unwrap();
        }

        let mut store = MockVectorIndexStore::new();
        for (kb, model) in indexed {
            let model = EmbeddingModel::parse(*model).unwrap();
            store = store.with_index(VectorIndex::new(name(kb), &model));
        }

        let indexes = Arc::new(VectorIndexService::new(
            Arc::new(store),
            Arc::new(StaticEmbeddingResolver::new(Arc::new(
                MockEmbeddingProvider::new("mock", 4),
            ))),
        ));

        KnowledgeBaseService::new(repository, indexes)
    }

    #[tokio::test]
    async fn test_list_compatible_requires_family_and_index() {
        let service = create_service(
            &[
                ("kb_openai", "text-embedding-3-small"),
                ("kb_ada", "text-embedding-ada-002"),
                ("kb_llama", "llama3.2"),
                ("kb_no_index", "text-embedding-3-large"),
            ],
            &[
                ("kb_openai", "text-embedding-3-small"),
                ("kb_ada", "text-embedding-ada-002"),
                ("kb_llama", "llama3.2"),
            ],
        )
        .await;

        let compatible = service
            .list_compatible("text-embedding-3-small")
            .await
            .unwrap();
        let mut names: Vec<&str> = compatible.iter().map(|kb| kb.name().as_str()).collect();
        names.sort();

        assert_eq!(names, vec!["kb_ada", "kb_openai"]);
    }

    #[tokio::test]
    async fn test_list_returns_all() {
        let service = create_service(
            &[("kb_a", "llama3.2"), ("kb_b", "gemma2")],
            &[],
        )
        .await;

        assert_eq!(service.list().await.unwrap().len(), 2);
        assert!(service.list_compatible("gemma2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_documents() {
        let service = create_service(&[("kb_a", "llama3.2")], &[]).await;
        service
            .repository
            .record_document(KnowledgeBaseDocument::new(
                name("kb_a"),
                "guide.pdf",
                DocumentType::Pdf,
                3,
                9,
            ))
            .await
            .unwrap();

        let documents = service.list_documents("kb_a").await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].filename, "guide.pdf");
        assert_eq!(documents[0].chunk_count, 9);
    }

    #[tokio::test]
    async fn test_list_documents_unknown_kb() {
        let service = create_service(&[], &[]).await;

        let result = service.list_documents("kb_missing").await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
