//! Hosted embeddings for `text*` models over the OpenAI `/v1/embeddings` API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::HttpClientTrait;
use crate::domain::embedding::{Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;
use crate::infrastructure::llm::DEFAULT_OPENAI_BASE_URL;

#[derive(Debug)]
pub struct OpenAiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiEmbeddingProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OpenAiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let body = serde_json::to_value(BatchRequest {
            model: request.model(),
            input: request.inputs(),
            encoding_format: "float",
        })
        .map_err(|e| DomainError::internal(format!("Failed to encode embedding request: {}", e)))?;

        let url = format!("{}/v1/embeddings", self.base_url);
        let headers = vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];
        let json = self.client.post_json(&url, headers, &body).await?;

        let batch: BatchResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider_unavailable(
                "openai",
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        if let Some(usage) = &batch.usage {
            debug!(
                model = %batch.model,
                inputs = request.inputs().len(),
                prompt_tokens = usage.prompt_tokens,
                "OpenAI embeddings"
            );
        }

        let embeddings = batch
            .data
            .into_iter()
            .map(|item| Embedding::new(item.index, item.embedding))
            .collect();

        Ok(EmbeddingResponse::new(batch.model, embeddings))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    model: String,
    data: Vec<BatchItem>,
    usage: Option<BatchUsage>,
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchUsage {
    prompt_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn mock_response(count: usize, dimensions: usize) -> serde_json::Value {
        // Returned in reverse to check reordering by index
        let data: Vec<serde_json::Value> = (0..count)
            .rev()
            .map(|i| {
                let embedding: Vec<f32> = (0..dimensions).map(|j| (i * 10 + j) as f32).collect();
                serde_json::json!({ "index": i, "embedding": embedding, "object": "embedding" })
            })
            .collect();

        serde_json::json!({
            "model": "text-embedding-3-small",
            "data": data,
            "usage": { "prompt_tokens": 10, "total_tokens": 10 }
        })
    }

    #[tokio::test]
    async fn test_embed_batch_in_input_order() {
        let client = MockHttpClient::new().with_response(TEST_URL, mock_response(3, 4));
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let vectors = provider
            .embed_texts(
                "text-embedding-3-small",
                vec!["a".into(), "b".into(), "c".into()],
            )
            .await
            .unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0][0], 0.0);
        assert_eq!(vectors[2][0], 20.0);

        let (_, body) = provider.client.bodies().remove(0);
        assert_eq!(body["input"], serde_json::json!(["a", "b", "c"]));
        assert_eq!(body["encoding_format"], "float");
    }

    #[tokio::test]
    async fn test_count_mismatch_is_unavailable() {
        let client = MockHttpClient::new().with_response(TEST_URL, mock_response(1, 4));
        let provider = OpenAiEmbeddingProvider::new(client, "key");

        let result = provider
            .embed_texts("text-embedding-3-small", vec!["a".into(), "b".into()])
            .await;

        assert!(matches!(result, Err(DomainError::ProviderUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_index_is_unavailable() {
        let response = serde_json::json!({
            "model": "text-embedding-3-small",
            "data": [
                { "index": 0, "embedding": [1.0, 0.0] },
                { "index": 0, "embedding": [0.0, 1.0] }
            ]
        });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let provider = OpenAiEmbeddingProvider::new(client, "key");

        let result = provider
            .embed_texts("text-embedding-3-small", vec!["a".into(), "b".into()])
            .await;

        assert!(matches!(result, Err(DomainError::ProviderUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_embed_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "Rate limit exceeded");
        let provider = OpenAiEmbeddingProvider::new(client, "test-api-key");

        let result = provider.embed_query("text-embedding-3-small", "Hello").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let url = "http://localhost:8080/v1/embeddings";
        let client = MockHttpClient::new().with_response(url, mock_response(1, 8));
        let provider =
            OpenAiEmbeddingProvider::with_base_url(client, "test-key", "http://localhost:8080");

        let vector = provider
            .embed_query("text-embedding-3-small", "Test")
            .await
            .unwrap();

        assert_eq!(vector.len(), 8);
    }
}
