//! Document ingestion service - parse, chunk, index and register one upload

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{LoadedIndex, VectorIndexService};
use crate::domain::ingestion::{
    ChunkingStrategyKind, DocumentParser, DocumentType, IngestError, IngestRequest, IngestResult,
};
use crate::domain::knowledge_base::{
    KnowledgeBase, KnowledgeBaseDocument, KnowledgeBaseName, KnowledgeBaseRepository,
};
use crate::domain::{DomainError, EmbeddingModel};
use crate::infrastructure::ingestion::{ChunkingEngine, ParserFactory};

/// Runs the ingestion pipeline for uploaded files
#[derive(Debug)]
pub struct IngestionService {
    parsers: HashMap<DocumentType, Arc<dyn DocumentParser>>,
    chunking: ChunkingEngine,
    indexes: Arc<VectorIndexService>,
    repository: Arc<dyn KnowledgeBaseRepository>,
}

impl IngestionService {
    pub fn new(
        chunking: ChunkingEngine,
        indexes: Arc<VectorIndexService>,
        repository: Arc<dyn KnowledgeBaseRepository>,
    ) -> Self {
        let parsers = [DocumentType::Pdf, DocumentType::Docx]
            .into_iter()
            .map(|t| (t, ParserFactory::create(t)))
            .collect();

        Self {
            parsers,
            chunking,
            indexes,
            repository,
        }
    }

    /// Replace the parser used for its document type
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parsers.insert(parser.document_type(), parser);
        self
    }

    /// Ingest one file; failures carry the request context
    #[instrument(
        skip(self, request),
        fields(filename = %request.filename, kb_name = %request.kb_name)
    )]
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestResult, IngestError> {
        match self.try_ingest(&request).await {
            Ok(result) => {
                info!(
                    page_count = result.page_count,
                    chunk_count = result.chunk_count,
                    "Ingested document"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "Ingestion failed");
                Err(IngestError::new(&request, e))
            }
        }
    }

    async fn try_ingest(&self, request: &IngestRequest) -> Result<IngestResult, DomainError> {
        let kb_name = KnowledgeBaseName::new(request.kb_name.as_str())?;
        let strategy = ChunkingStrategyKind::parse(&request.chunking_strategy)?;
        request.chunking.validate()?;
        let document_type = DocumentType::from_filename(&request.filename)?;
        let model = EmbeddingModel::parse(request.embedding_model.as_str())?;

        if request.bytes.is_empty() {
            return Err(DomainError::invalid_argument(format!(
                "'{}' is empty",
                request.filename
            )));
        }

        // Early rejection; re-checked under the KB lock below
        if let Some(kb) = self.repository.get(kb_name.as_str()).await? {
            check_model(&kb, &model)?;
        }

        let parser = self.parsers.get(&document_type).ok_or_else(|| {
            DomainError::invalid_argument(format!("No parser for {} files", document_type))
        })?;
        let pages = parser.parse(&request.filename, &request.bytes).await?;

        if pages.iter().all(|p| p.is_blank()) {
            return Err(DomainError::invalid_argument(format!(
                "No text could be extracted from '{}'",
                request.filename
            )));
        }

        let chunks = self
            .chunking
            .chunk(&pages, strategy.as_str(), request.chunking, &model)
            .await?;
        let chunk_count = chunks.len();

        {
            let _guard = self.indexes.lock(&kb_name).await;

            let existing = self.repository.get(kb_name.as_str()).await?;
            if let Some(kb) = &existing {
                check_model(kb, &model)?;
            }

            let loaded = self.indexes.load_or_discard(&kb_name, &model).await?;
            let fresh_index = !matches!(loaded, LoadedIndex::Existing(_));
            self.indexes
                .upsert(loaded.into_index(), &kb_name, chunks, &model)
                .await?;

            match existing {
                None => {
                    let created = KnowledgeBase::new(kb_name.clone(), model.id(), strategy);
                    match self.repository.create(created).await {
                        Ok(_) => {}
                        // Registered by another process since the read above
                        Err(DomainError::Conflict { .. }) => {
                            self.adopt_registered(&kb_name, &model, fresh_index).await?
                        }
                        Err(e) => return Err(e),
                    }
                }
                Some(kb) if fresh_index && kb.document_count() > 0 => {
                    warn!(
                        kb_name = %kb_name,
                        stale_documents = kb.document_count(),
                        stale_chunks = kb.chunk_count(),
                        "Index rebuilt, dropping documents it no longer holds"
                    );
                    self.repository.reset_documents(kb_name.as_str()).await?;
                }
                Some(_) => {}
            }

            self.repository
                .record_document(KnowledgeBaseDocument::new(
                    kb_name.clone(),
                    &request.filename,
                    document_type,
                    pages.len(),
                    chunk_count,
                ))
                .await?;
        }

        Ok(IngestResult {
            filename: request.filename.clone(),
            kb_name: kb_name.to_string(),
            page_count: pages.len(),
            chunk_count,
        })
    }

    /// Continue with a KB someone else registered; an index we just created
    /// for a model it does not use is removed again
    async fn adopt_registered(
        &self,
        kb_name: &KnowledgeBaseName,
        model: &EmbeddingModel,
        created_index: bool,
    ) -> Result<(), DomainError> {
        let kb = self.repository.get(kb_name.as_str()).await?.ok_or_else(|| {
            DomainError::conflict(format!("Knowledge base '{}' changed during ingestion", kb_name))
        })?;

        if let Err(e) = check_model(&kb, model) {
            if created_index {
                self.indexes.store().remove(kb_name, model.family()).await?;
            }
            return Err(e);
        }

        Ok(())
    }
}

fn check_model(kb: &KnowledgeBase, model: &EmbeddingModel) -> Result<(), DomainError> {
    if kb.embedding_model() == model.id() {
        return Ok(());
    }

    Err(DomainError::invalid_argument(format!(
        "Knowledge base '{}' uses embedding model '{}', not '{}'",
        kb.name(),
        kb.embedding_model(),
        model
    )))
}
