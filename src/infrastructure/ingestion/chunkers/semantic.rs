//! Semantic chunking strategy: break where consecutive sentences drift apart

use async_trait::async_trait;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::embedding::cosine_distance;
use crate::domain::ingestion::{
    Chunk, ChunkMetadata, ChunkingStrategy, ChunkingStrategyKind, PageText,
};
use crate::domain::{DomainError, EmbeddingProvider};

const PERCENTILE: f32 = 90.0;
const IQR_FACTOR: f32 = 1.5;
const STD_DEV_FACTOR: f32 = 3.0;
/// Neighbouring sentences embedded together with each sentence
const BUFFER_SIZE: usize = 1;

/// Chunking strategy that embeds sentence windows and splits at outlier distances
#[derive(Debug, Clone)]
pub struct SemanticChunker {
    kind: ChunkingStrategyKind,
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
}

impl SemanticChunker {
    pub fn new(
        kind: ChunkingStrategyKind,
        provider: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if !kind.is_semantic() {
            return Err(DomainError::invalid_argument(format!(
                "'{}' is not a semantic chunking strategy",
                kind
            )));
        }

        Ok(Self {
            kind,
            provider,
            model: model.into(),
        })
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Each sentence joined with its neighbours within `BUFFER_SIZE`
fn combine_with_neighbours(sentences: &[&str]) -> Vec<String> {
    (0..sentences.len())
        .map(|i| {
            let start = i.saturating_sub(BUFFER_SIZE);
            let end = (i + BUFFER_SIZE + 1).min(sentences.len());
            sentences[start..end].join(" ")
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks
fn percentile(sorted: &[f32], pct: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }

    let rank = pct / 100.0 * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f32)
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

/// Distance above which a breakpoint is placed
pub(crate) fn breakpoint_threshold(kind: ChunkingStrategyKind, distances: &[f32]) -> f32 {
    if distances.is_empty() {
        return f32::INFINITY;
    }

    let mut sorted = distances.to_vec();
    sorted.sort_by(f32::total_cmp);

    match kind {
        ChunkingStrategyKind::SemanticInterquartile => {
            let iqr = percentile(&sorted, 75.0) - percentile(&sorted, 25.0);
            mean(distances) + IQR_FACTOR * iqr
        }
        ChunkingStrategyKind::SemanticStdDev => {
            let mean = mean(distances);
            let variance =
                distances.iter().map(|d| (d - mean).powi(2)).sum::<f32>() / distances.len() as f32;
            mean + STD_DEV_FACTOR * variance.sqrt()
        }
        _ => percentile(&sorted, PERCENTILE),
    }
}

#[async_trait]
impl ChunkingStrategy for SemanticChunker {
    async fn split(&self, page: &PageText) -> Result<Vec<Chunk>, DomainError> {
        let sentences = split_sentences(&page.text);
        let metadata = || ChunkMetadata::new(&page.source, page.page);

        match sentences.len() {
            0 => return Ok(vec![]),
            1 => return Ok(vec![Chunk::new(sentences[0], metadata())]),
            _ => {}
        }

        let vectors = self
            .provider
            .embed_texts(&self.model, combine_with_neighbours(&sentences))
            .await?;

        let distances: Vec<f32> = vectors
            .windows(2)
            .map(|pair| cosine_distance(&pair[0], &pair[1]))
            .collect();
        let threshold = breakpoint_threshold(self.kind, &distances);

        let mut chunks = Vec::new();
        let mut start = 0;

        for (i, distance) in distances.iter().enumerate() {
            if *distance > threshold {
                chunks.push(Chunk::new(sentences[start..=i].join(" "), metadata()));
                start = i + 1;
            }
        }

        chunks.push(Chunk::new(sentences[start..].join(" "), metadata()));

        tracing::debug!(
            source = %page.source,
            page = page.page,
            sentences = sentences.len(),
            chunks = chunks.len(),
            threshold,
            "Semantic split"
        );

        Ok(chunks)
    }

    fn kind(&self) -> ChunkingStrategyKind {
        self.kind
    }
}
