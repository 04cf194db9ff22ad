//! Embedding model identifiers, provider kinds and families

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Backend class an embedding or chat model identifier routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Remote OpenAI-compatible API
    HostedApi,
    /// Locally hosted Ollama-compatible model server
    LocalServer,
    /// Generic local sentence-embedding server
    GenericLocal,
}

const LOCAL_SERVER_PREFIXES: &[&str] = &["deepseek", "llama", "gemma"];

impl ProviderKind {
    /// Classify an embedding model identifier
    pub fn for_embedding_model(model_id: &str) -> Self {
        let id = model_id.to_ascii_lowercase();

        if id.starts_with("text") {
            Self::HostedApi
        } else if LOCAL_SERVER_PREFIXES.iter().any(|p| id.starts_with(p)) {
            Self::LocalServer
        } else {
            Self::GenericLocal
        }
    }

    /// Classify a chat model identifier
    pub fn for_chat_model(model_id: &str) -> Self {
        if model_id.to_ascii_lowercase().starts_with("gpt") {
            Self::HostedApi
        } else {
            Self::LocalServer
        }
    }
}

/// Coarse compatibility class of embedding vectors.
///
/// Vectors are only comparable within one family, and indexes are laid out
/// on disk per family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingFamily {
    OpenAi,
    Llama,
    DeepSeek,
    Gemma,
    Other(String),
}

impl EmbeddingFamily {
    pub fn for_model(model_id: &str) -> Self {
        let id = model_id.to_ascii_lowercase();

        if id.starts_with("text-embedding") {
            Self::OpenAi
        } else if id.starts_with("llama") {
            Self::Llama
        } else if id.starts_with("deepseek") {
            Self::DeepSeek
        } else if id.starts_with("gemma") {
            Self::Gemma
        } else {
            Self::Other(sanitize_component(&id))
        }
    }

    /// Directory name used by the index store
    pub fn dir_name(&self) -> String {
        match self {
            Self::OpenAi => "openai".to_string(),
            Self::Llama => "llama3.2".to_string(),
            Self::DeepSeek => "deepseek".to_string(),
            Self::Gemma => "gemma2".to_string(),
            Self::Other(id) => format!("other-{}", id),
        }
    }
}

impl fmt::Display for EmbeddingFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dir_name())
    }
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// An embedding model identifier resolved once into its kind and family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddingModel {
    id: String,
    kind: ProviderKind,
    family: EmbeddingFamily,
}

impl EmbeddingModel {
    pub fn parse(model_id: impl Into<String>) -> Result<Self, DomainError> {
        let id = model_id.into().trim().to_string();

        if id.is_empty() {
            return Err(DomainError::provider_unavailable(
                "embedding",
                "Embedding model identifier cannot be empty",
            ));
        }

        Ok(Self {
            kind: ProviderKind::for_embedding_model(&id),
            family: EmbeddingFamily::for_model(&id),
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn family(&self) -> &EmbeddingFamily {
        &self.family
    }

    /// Whether vectors from `other` live in the same space as ours
    pub fn is_compatible_with(&self, other: &EmbeddingModel) -> bool {
        self.family == other.family
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_provider_kind() {
        assert_eq!(
            ProviderKind::for_embedding_model("text-embedding-3-small"),
            ProviderKind::HostedApi
        );
        assert_eq!(
            ProviderKind::for_embedding_model("llama3.2"),
            ProviderKind::LocalServer
        );
        assert_eq!(
            ProviderKind::for_embedding_model("deepseek-r1:7b"),
            ProviderKind::LocalServer
        );
        assert_eq!(
            ProviderKind::for_embedding_model("gemma2:2b"),
            ProviderKind::LocalServer
        );
        assert_eq!(
            ProviderKind::for_embedding_model("sentence-transformers/all-MiniLM-L6-v2"),
            ProviderKind::GenericLocal
        );
    }

    #[test]
    fn test_chat_provider_kind() {
        assert_eq!(ProviderKind::for_chat_model("gpt-4o-mini"), ProviderKind::HostedApi);
        assert_eq!(ProviderKind::for_chat_model("llama3.2"), ProviderKind::LocalServer);
    }

    #[test]
    fn test_family_dir_names() {
        assert_eq!(EmbeddingFamily::for_model("text-embedding-3-large").dir_name(), "openai");
        assert_eq!(EmbeddingFamily::for_model("llama3.2:latest").dir_name(), "llama3.2");
        assert_eq!(EmbeddingFamily::for_model("deepseek-r1").dir_name(), "deepseek");
        assert_eq!(EmbeddingFamily::for_model("gemma2").dir_name(), "gemma2");
        assert_eq!(
            EmbeddingFamily::for_model("BAAI/bge-small").dir_name(),
            "other-baai_bge-small"
        );
    }

    #[test]
    fn test_hosted_variants_share_family() {
        let small = EmbeddingModel::parse("text-embedding-3-small").unwrap();
        let ada = EmbeddingModel::parse("text-embedding-ada-002").unwrap();
        let llama = EmbeddingModel::parse("llama3.2").unwrap();

        assert!(small.is_compatible_with(&ada));
        assert!(!small.is_compatible_with(&llama));
    }

    #[test]
    fn test_generic_models_do_not_share_family() {
        let a = EmbeddingModel::parse("all-MiniLM-L6-v2").unwrap();
        let b = EmbeddingModel::parse("bge-small-en").unwrap();

        assert!(!a.is_compatible_with(&b));
    }

    #[test]
    fn test_empty_model_id_rejected() {
        let result = EmbeddingModel::parse("  ");

        assert!(matches!(
            result,
            Err(DomainError::ProviderUnavailable { .. })
        ));
    }
}
