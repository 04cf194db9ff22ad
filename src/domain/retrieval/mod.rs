//! Retrieval hits, score normalization and ranking

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ingestion::Chunk;
use crate::domain::DomainError;

/// Map a raw index distance to a similarity in (0, 1]
pub fn similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// One retrieved chunk, tagged with the knowledge base it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub chunk: Chunk,
    pub distance: f32,
    pub similarity: f32,
    pub kb_name: String,
}

impl RetrievalHit {
    pub fn new(chunk: Chunk, distance: f32, kb_name: impl Into<String>) -> Self {
        Self {
            similarity: similarity(distance),
            chunk,
            distance,
            kb_name: kb_name.into(),
        }
    }

    pub fn source(&self) -> &str {
        self.chunk.source()
    }

    /// 0-based page
    pub fn page(&self) -> u32 {
        self.chunk.page()
    }

    fn dedupe_key(&self) -> (String, u32) {
        (self.source().to_string(), self.page())
    }
}

/// Deduplicate by (source, page) keeping the most similar hit, then sort by
/// similarity, highest first. Ties keep their input order.
pub fn rank_hits(hits: Vec<RetrievalHit>) -> Vec<RetrievalHit> {
    let mut positions: HashMap<(String, u32), usize> = HashMap::new();
    let mut unique: Vec<RetrievalHit> = Vec::with_capacity(hits.len());

    for hit in hits {
        match positions.get(&hit.dedupe_key()) {
            Some(&pos) => {
                if hit.similarity > unique[pos].similarity {
                    unique[pos] = hit;
                }
            }
            None => {
                positions.insert(hit.dedupe_key(), unique.len());
                unique.push(hit);
            }
        }
    }

    unique.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    unique
}

/// Why a knowledge base contributed nothing to a retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No registry entry for the name
    NotRegistered,
    /// Registered with an embedding model from another family
    IncompatibleEmbedding { registered_model: String },
    IndexNotFound,
    IndexCorrupt(String),
    ProviderUnavailable(String),
    SearchFailed(String),
}

impl SkipReason {
    pub fn from_error(error: &DomainError) -> Self {
        match error {
            DomainError::IndexNotFound { .. } => Self::IndexNotFound,
            DomainError::IndexCorrupt { message, .. } => Self::IndexCorrupt(message.clone()),
            DomainError::ProviderUnavailable { .. } => Self::ProviderUnavailable(error.to_string()),
            other => Self::SearchFailed(other.to_string()),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered => write!(f, "knowledge base is not registered"),
            Self::IncompatibleEmbedding { registered_model } => write!(
                f,
                "knowledge base uses incompatible embedding model '{}'",
                registered_model
            ),
            Self::IndexNotFound => write!(f, "vector index not found"),
            Self::IndexCorrupt(message) => write!(f, "vector index corrupt: {}", message),
            Self::ProviderUnavailable(message) => write!(f, "{}", message),
            Self::SearchFailed(message) => write!(f, "search failed: {}", message),
        }
    }
}

/// Per-KB outcome of a retrieval, in request order
#[derive(Debug, Clone)]
pub struct KbRetrieval {
    pub kb_name: String,
    pub outcome: Result<Vec<RetrievalHit>, SkipReason>,
}

impl KbRetrieval {
    pub fn hits(&self) -> &[RetrievalHit] {
        match &self.outcome {
            Ok(hits) => hits,
            Err(_) => &[],
        }
    }

    pub fn has_hits(&self) -> bool {
        !self.hits().is_empty()
    }
}

/// Flatten per-KB outcomes into one ranked list
pub fn merge_retrievals(results: &[KbRetrieval]) -> Vec<RetrievalHit> {
    rank_hits(
        results
            .iter()
            .flat_map(|r| r.hits().iter().cloned())
            .collect(),
    )
}
