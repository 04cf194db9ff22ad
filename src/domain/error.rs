use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Provider unavailable: {provider} - {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Index not found for knowledge base '{kb_name}' in family '{family}'")]
    IndexNotFound { kb_name: String, family: String },

    #[error("Index corrupt at {path}: {message}")]
    IndexCorrupt { path: String, message: String },

    #[error("Synthesis failure: {message}")]
    SynthesisFailure { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn provider_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn index_not_found(kb_name: impl Into<String>, family: impl Into<String>) -> Self {
        Self::IndexNotFound {
            kb_name: kb_name.into(),
            family: family.into(),
        }
    }

    pub fn index_corrupt(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn synthesis_failure(message: impl Into<String>) -> Self {
        Self::SynthesisFailure {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
