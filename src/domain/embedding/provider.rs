//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for embedding backends (OpenAI, Ollama, local inference servers)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for the given input
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Embed a batch of texts, returning one vector per text in input order
    async fn embed_texts(
        &self,
        model: &str,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        self.embed(EmbeddingRequest::new(model, texts))
            .await?
            .into_vectors(expected)
            .map_err(|reason| DomainError::provider_unavailable(self.provider_name(), reason))
    }

    /// Embed a single query text
    async fn embed_query(&self, model: &str, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_texts(model, vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| {
                DomainError::provider_unavailable(self.provider_name(), "Empty embedding response")
            })
    }
}
