//! JSON-over-HTTP transport shared by the embedding and chat providers

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::DomainError;

/// Longest slice of an error body kept in messages
const MAX_ERROR_BODY: usize = 512;

/// POST a JSON body and read a JSON answer; every failure is `ProviderUnavailable`
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;
}

/// reqwest-backed client; clones share one connection pool
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

/// Host part of a URL, used as the provider name in errors
fn endpoint(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.client.post(url).json(body);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "timed out"
            } else if e.is_connect() {
                "unreachable"
            } else {
                "request failed"
            };
            DomainError::provider_unavailable(endpoint(url), format!("{} {}: {}", url, reason, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if let Some((idx, _)) = text.char_indices().nth(MAX_ERROR_BODY) {
                text.truncate(idx);
            }
            return Err(DomainError::provider_unavailable(
                endpoint(url),
                format!("HTTP {} from {}: {}", status, url, text),
            ));
        }

        response.json().await.map_err(|e| {
            DomainError::provider_unavailable(
                endpoint(url),
                format!("Invalid JSON from {}: {}", url, e),
            )
        })
    }
}
