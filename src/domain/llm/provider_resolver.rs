//! Resolution of chat model identifiers to providers

use std::fmt::Debug;
use std::sync::Arc;

use super::LlmProvider;
use crate::domain::DomainError;

/// Maps a chat model identifier to the provider that serves it
pub trait LlmProviderResolver: Send + Sync + Debug {
    fn resolve(&self, model_id: &str) -> Result<Arc<dyn LlmProvider>, DomainError>;
}

/// Resolver that hands out one provider for every model
#[derive(Debug)]
pub struct StaticLlmResolver {
    provider: Arc<dyn LlmProvider>,
}

impl StaticLlmResolver {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

impl LlmProviderResolver for StaticLlmResolver {
    fn resolve(&self, _model_id: &str) -> Result<Arc<dyn LlmProvider>, DomainError> {
        Ok(self.provider.clone())
    }
}
