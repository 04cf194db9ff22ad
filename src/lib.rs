//! PMP RAG Engine
//!
//! Retrieval-augmented question answering over independently maintained
//! knowledge bases:
//! - Ingestion of PDF and DOCX uploads with fixed, recursive and semantic chunking
//! - Per-(embedding family, knowledge base) vector indexes on disk
//! - Multi-KB retrieval with ranking, per-KB answers and cross-KB synthesis

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use config::RegistryBackend;
use domain::{
    DomainError, EmbeddingProviderResolver, KnowledgeBaseRepository, LlmProviderResolver,
};
use infrastructure::{
    embedding::ConfiguredEmbeddingResolver,
    ingestion::ChunkingEngine,
    knowledge_base::{InMemoryKnowledgeBaseRepository, PostgresKnowledgeBaseRepository},
    llm::{HttpClient, LlmProviderFactory},
    services::{
        IngestionService, KnowledgeBaseService, QueryEngine, RetrievalService, VectorIndexService,
    },
    vector_index::FileVectorIndexStore,
};

/// Fully wired engine: ingestion, querying and registry access
#[derive(Debug, Clone)]
pub struct RagEngine {
    pub ingestion: Arc<IngestionService>,
    pub queries: Arc<QueryEngine>,
    pub knowledge_bases: Arc<KnowledgeBaseService>,
}

impl RagEngine {
    /// Build every provider, store and service from configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        let client = HttpClient::with_timeout(config.providers.timeout())?;

        let embeddings: Arc<dyn EmbeddingProviderResolver> = Arc::new(
            ConfiguredEmbeddingResolver::new(client.clone(), config.providers.clone()),
        );
        let llms: Arc<dyn LlmProviderResolver> =
            Arc::new(LlmProviderFactory::new(client, config.providers.clone()));

        let repository = create_repository(config).await?;

        info!(index_root = %config.storage.index_root.display(), "Using file vector index store");
        let store = Arc::new(FileVectorIndexStore::new(&config.storage.index_root));
        let indexes = Arc::new(VectorIndexService::new(store, embeddings.clone()));

        Ok(Self::from_parts(
            indexes,
            repository,
            embeddings,
            llms,
            config.retrieval.clone(),
        ))
    }

    /// Wire services around already constructed collaborators
    pub fn from_parts(
        indexes: Arc<VectorIndexService>,
        repository: Arc<dyn KnowledgeBaseRepository>,
        embeddings: Arc<dyn EmbeddingProviderResolver>,
        llms: Arc<dyn LlmProviderResolver>,
        retrieval: config::RetrievalConfig,
    ) -> Self {
        let ingestion = IngestionService::new(
            ChunkingEngine::new(embeddings.clone()),
            indexes.clone(),
            repository.clone(),
        );
        let retrieval_service = Arc::new(RetrievalService::new(
            indexes.clone(),
            repository.clone(),
            embeddings,
        ));

        Self {
            ingestion: Arc::new(ingestion),
            queries: Arc::new(QueryEngine::new(retrieval_service, llms, retrieval)),
            knowledge_bases: Arc::new(KnowledgeBaseService::new(repository, indexes)),
        }
    }
}

async fn create_repository(
    config: &AppConfig,
) -> Result<Arc<dyn KnowledgeBaseRepository>, DomainError> {
    match config.storage.registry {
        RegistryBackend::Postgres => {
            let url = config.storage.database_url.as_deref().ok_or_else(|| {
                DomainError::configuration("storage.database_url is required for the postgres registry")
            })?;

            info!("Connecting to PostgreSQL...");
            let repository =
                PostgresKnowledgeBaseRepository::connect(url, config.storage.max_connections)
                    .await?;
            repository.migrate().await?;
            info!("PostgreSQL registry ready");

            Ok(Arc::new(repository))
        }
        RegistryBackend::Memory => {
            warn!("Using in-memory knowledge base registry; registrations are lost on exit");
            Ok(Arc::new(InMemoryKnowledgeBaseRepository::new()))
        }
    }
}
