use moka::sync::Cache;
use std::sync::Arc;

use super::{LocalEmbeddingProvider, OllamaEmbeddingProvider, OpenAiEmbeddingProvider};
use crate::config::ProvidersConfig;
use crate::domain::{
    DomainError, EmbeddingModel, EmbeddingProvider, EmbeddingProviderResolver, ProviderKind,
};
use crate::infrastructure::llm::HttpClientTrait;

/// Resolves embedding models to configured HTTP providers.
///
/// Providers are model-agnostic, so one instance per provider kind is
/// built on first use and reused afterwards.
#[derive(Debug)]
pub struct ConfiguredEmbeddingResolver<C: HttpClientTrait + Clone + 'static> {
    client: C,
    config: ProvidersConfig,
    providers: Cache<ProviderKind, Arc<dyn EmbeddingProvider>>,
}

impl<C: HttpClientTrait + Clone + 'static> ConfiguredEmbeddingResolver<C> {
    pub fn new(client: C, config: ProvidersConfig) -> Self {
        let providers = Cache::builder().max_capacity(8).build();

        Self {
            client,
            config,
            providers,
        }
    }

    fn build(&self, kind: ProviderKind) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        let provider: Arc<dyn EmbeddingProvider> = match kind {
            ProviderKind::HostedApi => {
                let api_key = self.config.openai_api_key().ok_or_else(|| {
                    DomainError::provider_unavailable(
                        "openai",
                        "No OpenAI API key configured (set OPENAI_API_KEY)",
                    )
                })?;

                Arc::new(OpenAiEmbeddingProvider::with_base_url(
                    self.client.clone(),
                    api_key,
                    &self.config.openai_base_url,
                ))
            }
            ProviderKind::LocalServer => Arc::new(OllamaEmbeddingProvider::with_base_url(
                self.client.clone(),
                &self.config.ollama_base_url,
            )),
            ProviderKind::GenericLocal => Arc::new(LocalEmbeddingProvider::new(
                self.client.clone(),
                &self.config.local_embedding_base_url,
            )),
        };

        tracing::debug!(
            provider = provider.provider_name(),
            kind = ?kind,
            "Created embedding provider"
        );

        Ok(provider)
    }
}

impl<C: HttpClientTrait + Clone + 'static> EmbeddingProviderResolver
    for ConfiguredEmbeddingResolver<C>
{
    fn resolve(&self, model: &EmbeddingModel) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        let kind = model.kind();

        if let Some(provider) = self.providers.get(&kind) {
            return Ok(provider);
        }

        let provider = self.build(kind)?;
        self.providers.insert(kind, provider.clone());

        Ok(provider)
    }
}
