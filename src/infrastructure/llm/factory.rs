use std::sync::Arc;

use super::http_client::HttpClientTrait;
use super::{OllamaProvider, OpenAiProvider};
use crate::config::ProvidersConfig;
use crate::domain::{DomainError, LlmProvider, LlmProviderResolver, ProviderKind};

/// Builds chat providers by provider kind
#[derive(Debug, Clone)]
pub struct LlmProviderFactory<C: HttpClientTrait + Clone + 'static> {
    client: C,
    config: ProvidersConfig,
}

impl<C: HttpClientTrait + Clone + 'static> LlmProviderFactory<C> {
    pub fn new(client: C, config: ProvidersConfig) -> Self {
        Self { client, config }
    }

    pub fn create(&self, kind: ProviderKind) -> Result<Arc<dyn LlmProvider>, DomainError> {
        match kind {
            ProviderKind::HostedApi => {
                let api_key = self.config.openai_api_key().ok_or_else(|| {
                    DomainError::provider_unavailable(
                        "openai",
                        "No OpenAI API key configured (set OPENAI_API_KEY)",
                    )
                })?;

                Ok(Arc::new(OpenAiProvider::with_base_url(
                    self.client.clone(),
                    api_key,
                    &self.config.openai_base_url,
                )))
            }
            ProviderKind::LocalServer | ProviderKind::GenericLocal => Ok(Arc::new(
                OllamaProvider::with_base_url(self.client.clone(), &self.config.ollama_base_url),
            )),
        }
    }
}

impl<C: HttpClientTrait + Clone + 'static> LlmProviderResolver for LlmProviderFactory<C> {
    fn resolve(&self, model_id: &str) -> Result<Arc<dyn LlmProvider>, DomainError> {
        self.create(ProviderKind::for_chat_model(model_id))
    }
}
