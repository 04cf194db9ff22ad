//! Knowledge base entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_knowledge_base_name, KnowledgeBaseValidationError};
use crate::domain::embedding::EmbeddingModel;
use crate::domain::ingestion::{ChunkingStrategyKind, DocumentType};
use crate::domain::DomainError;

/// Knowledge base name - letters, digits, '_' and '-', max 64 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KnowledgeBaseName(String);

impl KnowledgeBaseName {
    pub fn new(name: impl Into<String>) -> Result<Self, KnowledgeBaseValidationError> {
        let name = name.into();
        validate_knowledge_base_name(&name)?;
        Ok(Self(name))
    }

    /// Derive a name from an uploaded filename, e.g. `report.pdf` -> `kb_report`
    pub fn from_filename(filename: &str) -> Result<Self, KnowledgeBaseValidationError> {
        let base = filename
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(filename);
        let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);
        let sanitized: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();

        let mut name = format!("kb_{}", sanitized);
        name.truncate(super::validation::MAX_KB_NAME_LENGTH);

        Self::new(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KnowledgeBaseName {
    type Error = KnowledgeBaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KnowledgeBaseName> for String {
    fn from(name: KnowledgeBaseName) -> Self {
        name.0
    }
}

impl std::fmt::Display for KnowledgeBaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<KnowledgeBaseValidationError> for DomainError {
    fn from(error: KnowledgeBaseValidationError) -> Self {
        DomainError::invalid_argument(error.to_string())
    }
}

/// Registered knowledge base.
///
/// The embedding model is fixed at creation; only the counters change
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    name: KnowledgeBaseName,
    embedding_model: String,
    chunking_strategy: ChunkingStrategyKind,
    document_count: u64,
    chunk_count: u64,
    created_at: DateTime<Utc>,
}

impl KnowledgeBase {
    pub fn new(
        name: KnowledgeBaseName,
        embedding_model: impl Into<String>,
        chunking_strategy: ChunkingStrategyKind,
    ) -> Self {
        Self {
            name,
            embedding_model: embedding_model.into(),
            chunking_strategy,
            document_count: 0,
            chunk_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Rebuild an entity from stored fields
    pub fn restore(
        name: KnowledgeBaseName,
        embedding_model: String,
        chunking_strategy: ChunkingStrategyKind,
        document_count: u64,
        chunk_count: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            embedding_model,
            chunking_strategy,
            document_count,
            chunk_count,
            created_at,
        }
    }

    pub fn name(&self) -> &KnowledgeBaseName {
        &self.name
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn chunking_strategy(&self) -> ChunkingStrategyKind {
        self.chunking_strategy
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this KB's vectors share a space with `model`
    pub fn is_compatible_with(&self, model: &EmbeddingModel) -> bool {
        EmbeddingModel::parse(self.embedding_model.as_str())
            .map(|own| own.is_compatible_with(model))
            .unwrap_or(false)
    }

    /// Count one more ingested document
    pub fn record_document(&mut self, chunk_count: usize) {
        self.document_count += 1;
        self.chunk_count += chunk_count as u64;
    }

    /// Forget all documents; the index they lived in is gone
    pub fn clear_documents(&mut self) {
        self.document_count = 0;
        self.chunk_count = 0;
    }
}

/// A document ingested into a knowledge base; immutable once recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseDocument {
    pub id: Uuid,
    pub kb_name: KnowledgeBaseName,
    pub filename: String,
    pub document_type: DocumentType,
    pub page_count: u32,
    pub chunk_count: u32,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeBaseDocument {
    pub fn new(
        kb_name: KnowledgeBaseName,
        filename: impl Into<String>,
        document_type: DocumentType,
        page_count: usize,
        chunk_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kb_name,
            filename: filename.into(),
            document_type,
            page_count: page_count as u32,
            chunk_count: chunk_count as u32,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> KnowledgeBaseName {
        KnowledgeBaseName::new(value).unwrap()
    }

    #[test]
    fn test_name_from_filename() {
        assert_eq!(
            KnowledgeBaseName::from_filename("Annual Report.pdf").unwrap().as_str(),
            "kb_Annual_Report"
        );
        assert_eq!(
            KnowledgeBaseName::from_filename("/tmp/uploads/guide.v2.docx")
                .unwrap()
                .as_str(),
            "kb_guide_v2"
        );
    }

    #[test]
    fn test_name_serde_validates() {
        let ok: Result<KnowledgeBaseName, _> = serde_json::from_str("\"kb_a\"");
        let bad: Result<KnowledgeBaseName, _> = serde_json::from_str("\"../a\"");

        assert!(ok.is_ok());
        assert!(bad.is_err());
    }

    #[test]
    fn test_record_document_keeps_model_and_strategy() {
        let mut kb = KnowledgeBase::new(
            name("kb_a"),
            "text-embedding-3-small",
            ChunkingStrategyKind::Recursive,
        );

        kb.record_document(12);
        kb.record_document(3);

        assert_eq!(kb.document_count(), 2);
        assert_eq!(kb.chunk_count(), 15);
        assert_eq!(kb.embedding_model(), "text-embedding-3-small");
        assert_eq!(kb.chunking_strategy(), ChunkingStrategyKind::Recursive);

        kb.clear_documents();

        assert_eq!(kb.document_count(), 0);
        assert_eq!(kb.chunk_count(), 0);
        assert_eq!(kb.embedding_model(), "text-embedding-3-small");
    }

    #[test]
    fn test_compatibility_by_family() {
        let kb = KnowledgeBase::new(name("kb_a"), "text-embedding-3-small", ChunkingStrategyKind::Fixed);

        assert!(kb.is_compatible_with(&EmbeddingModel::parse("text-embedding-ada-002").unwrap()));
        assert!(!kb.is_compatible_with(&EmbeddingModel::parse("gemma2").unwrap()));
    }
}
