//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, ChunkingDefaults, LogFormat, LoggingConfig, NoResultPolicy, ProvidersConfig,
    RegistryBackend, RetrievalConfig, StorageConfig,
};
