//! Generic local embedding server (text-embeddings-inference `/embed` API)

use async_trait::async_trait;

use super::HttpClientTrait;
use crate::domain::embedding::{Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Embeddings from a locally hosted sentence-embedding server.
///
/// The server hosts one model; the request model id is only used for
/// bookkeeping.
#[derive(Debug)]
pub struct LocalEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> LocalEmbeddingProvider<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for LocalEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let url = format!("{}/embed", self.base_url);
        let body = serde_json::json!({ "inputs": request.inputs(), "normalize": true });
        let headers = vec![("Content-Type", "application/json")];

        let json = self.client.post_json(&url, headers, &body).await?;
        let vectors: Vec<Vec<f32>> = serde_json::from_value(json).map_err(|e| {
            DomainError::provider_unavailable(
                "local",
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        let embeddings = vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| Embedding::new(i, v))
            .collect();

        Ok(EmbeddingResponse::new(request.model(), embeddings))
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
