//! Embedding models, providers and vector math

mod batch;
mod distance;
mod model;
mod provider;
mod resolver;

pub use batch::{Embedding, EmbeddingRequest, EmbeddingResponse};
pub use distance::{cosine_distance, cosine_similarity};
pub use model::{EmbeddingFamily, EmbeddingModel, ProviderKind};
pub use provider::EmbeddingProvider;
pub use resolver::{EmbeddingProviderResolver, StaticEmbeddingResolver};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
