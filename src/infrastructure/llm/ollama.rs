//! Ollama chat provider for locally hosted models

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::{DomainError, LlmProvider, LlmRequest, LlmResponse, Message};

pub(crate) const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Chat provider talking to an Ollama server's `/api/chat`
#[derive(Debug)]
pub struct OllamaProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
}

impl<C: HttpClientTrait> OllamaProvider<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OllamaProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let options = ChatOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        };
        let body = serde_json::to_value(ChatRequest {
            model,
            messages: &request.messages,
            stream: false,
            options: (options.temperature.is_some() || options.num_predict.is_some())
                .then_some(options),
        })
        .map_err(|e| DomainError::internal(format!("Failed to encode chat request: {}", e)))?;

        let headers = vec![("Content-Type", "application/json")];
        let json = self.client.post_json(&self.chat_url(), headers, &body).await?;

        let response: ChatResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider_unavailable("ollama", format!("Failed to parse response: {}", e))
        })?;

        debug!(
            model = %response.model,
            prompt_tokens = response.prompt_eval_count,
            completion_tokens = response.eval_count,
            "Ollama completion"
        );

        Ok(LlmResponse::new(
            response.model,
            Message::assistant(response.message.content),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    message: ResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "http://localhost:11434/api/chat";

    #[tokio::test]
    async fn test_ollama_chat_keeps_language() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            serde_json::json!({
                "model": "llama3.2",
                "message": { "role": "assistant", "content": "مرحبا" },
                "done": true,
                "prompt_eval_count": 12,
                "eval_count": 3
            }),
        );
        let provider = OllamaProvider::new(client);

        let response = provider
            .chat(
                "llama3.2",
                LlmRequest::builder().user("hi").temperature(0.7).build(),
            )
            .await
            .unwrap();

        assert_eq!(response.content(), "مرحبا");

        let (_, body) = provider.client.bodies().remove(0);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!(body["options"].get("num_predict").is_none());
    }

    #[tokio::test]
    async fn test_options_omitted_when_unset() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            serde_json::json!({
                "model": "gemma2",
                "message": { "role": "assistant", "content": "ok" }
            }),
        );
        let provider = OllamaProvider::new(client);

        provider
            .chat("gemma2", LlmRequest::builder().user("hi").build())
            .await
            .unwrap();

        let (_, body) = provider.client.bodies().remove(0);
        assert!(body.get("options").is_none());
    }

    #[tokio::test]
    async fn test_ollama_unreachable() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");
        let provider = OllamaProvider::new(client);

        let result = provider
            .chat("gemma2", LlmRequest::builder().user("hi").build())
            .await;

        assert!(matches!(result, Err(DomainError::ProviderUnavailable { .. })));
    }
}
