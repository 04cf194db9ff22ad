use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub providers: ProvidersConfig,
    pub retrieval: RetrievalConfig,
    pub chunking: ChunkingDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where vector indexes and registry rows live
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per embedding family
    pub index_root: PathBuf,
    pub registry: RegistryBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    #[default]
    Memory,
    Postgres,
}

/// Endpoints of the embedding and chat backends
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub ollama_base_url: String,
    /// Text-embeddings-inference compatible server for other models
    pub local_embedding_base_url: String,
    pub timeout_secs: u64,
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured API key, falling back to `OPENAI_API_KEY`
    pub fn openai_api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// What to answer when no knowledge base produced anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoResultPolicy {
    /// Return the fixed "no information" message
    #[default]
    Report,
    /// Answer directly from the chat model without retrieval
    DirectAnswer,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub no_result_policy: NoResultPolicy,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingDefaults {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_root: PathBuf::from("data/indexes"),
            registry: RegistryBackend::default(),
            database_url: None,
            max_connections: 10,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com".to_string(),
            openai_api_key: None,
            ollama_base_url: "http://localhost:11434".to_string(),
            local_embedding_base_url: "http://localhost:8081".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            no_result_policy: NoResultPolicy::default(),
            temperature: 0.7,
        }
    }
}

impl Default for ChunkingDefaults {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
