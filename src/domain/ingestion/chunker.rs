//! Chunking strategy trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

use super::PageText;
use crate::domain::DomainError;

/// Named chunking strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategyKind {
    /// Naive fixed-size character windows
    Fixed,
    /// Separator-aware splitting ("\n\n", "\n", " ", chars)
    Recursive,
    /// Semantic breakpoints above the 90th percentile of distances
    SemanticPercentile,
    /// Semantic breakpoints above mean + 1.5 IQR
    SemanticInterquartile,
    /// Semantic breakpoints above mean + 3 standard deviations
    SemanticStdDev,
}

impl ChunkingStrategyKind {
    pub const ALL: [ChunkingStrategyKind; 5] = [
        Self::Fixed,
        Self::Recursive,
        Self::SemanticPercentile,
        Self::SemanticInterquartile,
        Self::SemanticStdDev,
    ];

    /// Parse a strategy name; unknown names are a caller error
    pub fn parse(name: &str) -> Result<Self, DomainError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fixed" | "text_splitter" => Ok(Self::Fixed),
            "recursive" => Ok(Self::Recursive),
            "semantic_percentile" => Ok(Self::SemanticPercentile),
            "semantic_interquartile" => Ok(Self::SemanticInterquartile),
            "semantic_std_dev" | "semantic_standard_deviation" => Ok(Self::SemanticStdDev),
            other => Err(DomainError::invalid_argument(format!(
                "Unknown chunking strategy '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Recursive => "recursive",
            Self::SemanticPercentile => "semantic_percentile",
            Self::SemanticInterquartile => "semantic_interquartile",
            Self::SemanticStdDev => "semantic_std_dev",
        }
    }

    /// Whether the strategy needs embeddings to find boundaries
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            Self::SemanticPercentile | Self::SemanticInterquartile | Self::SemanticStdDev
        )
    }
}

impl fmt::Display for ChunkingStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size parameters for the character-window strategies
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_size == 0 {
            return Err(DomainError::invalid_argument(
                "chunk_size must be greater than 0",
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::invalid_argument(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Provenance of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document filename
    pub source: String,
    /// Page number, 0-based
    pub page: u32,
    /// Character offset of the chunk within its page, when it is an exact substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
}

impl ChunkMetadata {
    pub fn new(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: source.into(),
            page,
            start_index: None,
        }
    }

    pub fn with_start_index(mut self, start: usize) -> Self {
        self.start_index = Some(start);
        self
    }

    /// Page number as shown to users
    pub fn display_page(&self) -> u32 {
        self.page + 1
    }
}

/// A retrievable span of document text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    pub fn source(&self) -> &str {
        &self.metadata.source
    }

    pub fn page(&self) -> u32 {
        self.metadata.page
    }
}

/// Trait for chunking strategies.
///
/// A strategy splits one page at a time so every chunk keeps the page it
/// came from.
#[async_trait]
pub trait ChunkingStrategy: Send + Sync + Debug {
    async fn split(&self, page: &PageText) -> Result<Vec<Chunk>, DomainError>;

    fn kind(&self) -> ChunkingStrategyKind;
}
