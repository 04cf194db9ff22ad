//! Chunking engine: pages in, chunks out

use std::sync::Arc;

use tracing::instrument;

use super::ChunkerFactory;
use crate::domain::ingestion::{Chunk, ChunkingConfig, ChunkingStrategyKind, PageText};
use crate::domain::{DomainError, EmbeddingModel, EmbeddingProviderResolver};

/// Splits document pages into chunks under a named strategy.
///
/// The embedding provider is only resolved for semantic strategies.
#[derive(Debug, Clone)]
pub struct ChunkingEngine {
    resolver: Arc<dyn EmbeddingProviderResolver>,
}

impl ChunkingEngine {
    pub fn new(resolver: Arc<dyn EmbeddingProviderResolver>) -> Self {
        Self { resolver }
    }

    #[instrument(skip(self, pages, config), fields(page_count = pages.len(), model = %model))]
    pub async fn chunk(
        &self,
        pages: &[PageText],
        strategy: &str,
        config: ChunkingConfig,
        model: &EmbeddingModel,
    ) -> Result<Vec<Chunk>, DomainError> {
        let kind = ChunkingStrategyKind::parse(strategy)?;
        config.validate()?;

        let provider = if kind.is_semantic() {
            Some(self.resolver.resolve(model)?)
        } else {
            None
        };
        let chunker = ChunkerFactory::create(kind, config, provider, model.id())?;

        let mut chunks = Vec::new();
        for page in pages.iter().filter(|p| !p.is_blank()) {
            chunks.extend(chunker.split(page).await?);
        }

        tracing::debug!(strategy = %kind, chunk_count = chunks.len(), "Chunked document");

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{MockEmbeddingProvider, StaticEmbeddingResolver};

    fn engine(provider: MockEmbeddingProvider) -> (ChunkingEngine, Arc<MockEmbeddingProvider>) {
        let provider = Arc::new(provider);
        let resolver = Arc::new(StaticEmbeddingResolver::new(provider.clone()));
        (ChunkingEngine::new(resolver), provider)
    }

    fn model() -> EmbeddingModel {
        EmbeddingModel::parse("llama3.2").unwrap()
    }

    fn pages() -> Vec<PageText> {
        vec![
            PageText::new("manual.pdf", 0, "Intro text on the first page."),
            PageText::new("manual.pdf", 1, "   "),
            PageText::new("manual.pdf", 2, "Closing words. They end here."),
        ]
    }

    #[tokio::test]
    async fn test_chunks_keep_page_and_skip_blank_pages() {
        let (engine, provider) = engine(MockEmbeddingProvider::new("mock", 4));

        let chunks = engine
            .chunk(&pages(), "recursive", ChunkingConfig::default(), &model())
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page(), 0);
        assert_eq!(chunks[1].page(), 2);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_semantic_strategy_embeds() {
        let (engine, provider) = engine(MockEmbeddingProvider::new("mock", 4));

        let chunks = engine
            .chunk(&pages(), "semantic_percentile", ChunkingConfig::default(), &model())
            .await
            .unwrap();

        assert!(!chunks.is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_strategy() {
        let (engine, _) = engine(MockEmbeddingProvider::new("mock", 4));

        let result = engine
            .chunk(&pages(), "by_vibes", ChunkingConfig::default(), &model())
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_invalid_sizes() {
        let (engine, _) = engine(MockEmbeddingProvider::new("mock", 4));

        let result = engine
            .chunk(&pages(), "fixed", ChunkingConfig::new(10, 10), &model())
            .await;

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_semantic_embedding_failure() {
        let (engine, _) = engine(MockEmbeddingProvider::new("mock", 4).with_error("offline"));

        let result = engine
            .chunk(&pages(), "semantic_std_dev", ChunkingConfig::default(), &model())
            .await;

        assert!(matches!(result, Err(DomainError::ProviderUnavailable { .. })));
    }
}
