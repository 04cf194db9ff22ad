use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for chat model backends (OpenAI, Ollama)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::Message;
    use std::sync::Mutex;

    /// Scripted chat provider.
    ///
    /// Rules are checked in order against the full request transcript; the
    /// first rule whose needle occurs decides the reply.
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        rules: Vec<(String, Result<String, String>)>,
        default_reply: Option<String>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                rules: Vec::new(),
                default_reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
            self.default_reply = Some(reply.into());
            self
        }

        pub fn reply_when(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
            self.rules.push((needle.into(), Ok(reply.into())));
            self
        }

        pub fn fail_when(mut self, needle: impl Into<String>, error: impl Into<String>) -> Self {
            self.rules.push((needle.into(), Err(error.into())));
            self
        }

        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(
            &self,
            model: &str,
            request: LlmRequest,
        ) -> Result<LlmResponse, DomainError> {
            let transcript = request.transcript();
            self.requests.lock().unwrap().push(request);

            let outcome = self
                .rules
                .iter()
                .find(|(needle, _)| transcript.contains(needle.as_str()))
                .map(|(_, outcome)| outcome.clone())
                .or_else(|| self.default_reply.clone().map(Ok))
                .unwrap_or_else(|| Err("No mock reply configured".to_string()));

            match outcome {
                Ok(reply) => Ok(LlmResponse::new(model, Message::assistant(reply))),
                Err(error) => Err(DomainError::provider_unavailable(self.name, error)),
            }
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
