//! Embedding provider implementations

mod ollama;
mod openai;
mod resolver;
mod tei;

pub use ollama::OllamaEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;
pub use resolver::ConfiguredEmbeddingResolver;
pub use tei::LocalEmbeddingProvider;

pub use super::llm::{HttpClient, HttpClientTrait};
