//! Resolution of embedding model identifiers to providers

use std::fmt::Debug;
use std::sync::Arc;

use super::{EmbeddingModel, EmbeddingProvider};
use crate::domain::DomainError;

/// Maps a parsed embedding model to the provider that serves it.
///
/// Implementations may connect lazily; an unreachable or unconfigured
/// backend is reported as `ProviderUnavailable`.
pub trait EmbeddingProviderResolver: Send + Sync + Debug {
    fn resolve(&self, model: &EmbeddingModel) -> Result<Arc<dyn EmbeddingProvider>, DomainError>;
}

/// Resolver that hands out one provider for every model
#[derive(Debug)]
pub struct StaticEmbeddingResolver {
    provider: Arc<dyn EmbeddingProvider>,
}

impl StaticEmbeddingResolver {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

impl EmbeddingProviderResolver for StaticEmbeddingResolver {
    fn resolve(&self, _model: &EmbeddingModel) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
        Ok(self.provider.clone())
    }
}
