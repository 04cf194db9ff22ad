//! Ollama embedding provider for locally served models

use async_trait::async_trait;
use serde::Deserialize;

use super::HttpClientTrait;
use crate::domain::embedding::{Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;
use crate::infrastructure::llm::DEFAULT_OLLAMA_BASE_URL;

/// Embeddings from an Ollama server's `/api/embed`
#[derive(Debug)]
pub struct OllamaEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> OllamaEmbeddingProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OllamaEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let body = serde_json::json!({
            "model": request.model(),
            "input": request.inputs(),
        });
        let headers = vec![("Content-Type", "application/json")];

        let json = self.client.post_json(&self.embed_url(), headers, &body).await?;
        let response: OllamaEmbedResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider_unavailable(
                "ollama",
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        let embeddings = response
            .embeddings
            .into_iter()
            .enumerate()
            .map(|(i, v)| Embedding::new(i, v))
            .collect();

        Ok(EmbeddingResponse::new(request.model(), embeddings))
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}
