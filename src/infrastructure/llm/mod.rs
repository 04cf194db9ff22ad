//! Chat model provider implementations

mod factory;
mod http_client;
mod ollama;
mod openai;

pub use factory::LlmProviderFactory;
pub use http_client::{HttpClient, HttpClientTrait};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

pub(crate) use ollama::DEFAULT_OLLAMA_BASE_URL;
pub(crate) use openai::DEFAULT_OPENAI_BASE_URL;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
