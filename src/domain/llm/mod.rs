//! Chat model domain types and traits

mod chat;
mod provider;
mod provider_resolver;

pub use chat::{LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole};
pub use provider::LlmProvider;
pub use provider_resolver::{LlmProviderResolver, StaticLlmResolver};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
