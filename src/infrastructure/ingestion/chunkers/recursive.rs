//! Recursive chunking strategy

use async_trait::async_trait;
use std::collections::VecDeque;
use std::ops::Range;

use crate::domain::ingestion::{
    Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy, ChunkingStrategyKind, PageText,
};
use crate::domain::DomainError;

const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

/// Chunking strategy that splits on the coarsest separator that works
///
/// Splitting order: paragraphs -> lines -> words -> characters. Pieces keep
/// their separator, so every chunk is an exact substring of its page.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

fn char_len(text: &str, span: &Range<usize>) -> usize {
    text[span.clone()].chars().count()
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split `span` into contiguous pieces no longer than `chunk_size` chars
    fn split_span(&self, text: &str, span: Range<usize>, level: usize, out: &mut Vec<Range<usize>>) {
        if char_len(text, &span) <= self.config.chunk_size {
            out.push(span);
            return;
        }

        let Some(separator) = SEPARATORS.get(level) else {
            // Last resort: single characters
            let base = span.start;
            out.extend(
                text[span]
                    .char_indices()
                    .map(|(i, c)| base + i..base + i + c.len_utf8()),
            );
            return;
        };

        let pieces = split_keeping_separator(text, span.clone(), separator);

        if pieces.len() <= 1 {
            self.split_span(text, span, level + 1, out);
            return;
        }

        for piece in pieces {
            self.split_span(text, piece, level + 1, out);
        }
    }

    /// Greedily merge pieces up to `chunk_size`, carrying up to `chunk_overlap`
    fn merge(&self, text: &str, pieces: Vec<Range<usize>>) -> Vec<Range<usize>> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut windows = Vec::new();
        let mut current: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(text, &piece);

            if total + len > size && !current.is_empty() {
                windows.push(window_of(&current));

                while !current.is_empty() && (total > overlap || total + len > size) {
                    if let Some((_, dropped)) = current.pop_front() {
                        total -= dropped;
                    }
                }
            }

            total += len;
            current.push_back((piece, len));
        }

        if !current.is_empty() {
            windows.push(window_of(&current));
        }

        windows
    }
}

fn window_of(pieces: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    let start = pieces.front().map(|(r, _)| r.start).unwrap_or_default();
    let end = pieces.back().map(|(r, _)| r.end).unwrap_or(start);
    start..end
}

/// Split at `separator`, each piece ending with the separator that follows it
fn split_keeping_separator(text: &str, span: Range<usize>, separator: &str) -> Vec<Range<usize>> {
    let base = span.start;
    let slice = &text[span.clone()];

    let mut pieces = Vec::new();
    let mut start = 0;

    for (idx, _) in slice.match_indices(separator) {
        let end = idx + separator.len();
        if end > start {
            pieces.push(base + start..base + end);
        }
        start = end;
    }

    if start < slice.len() {
        pieces.push(base + start..span.end);
    }

    pieces
}

#[async_trait]
impl ChunkingStrategy for RecursiveChunker {
    async fn split(&self, page: &PageText) -> Result<Vec<Chunk>, DomainError> {
        if page.is_blank() {
            return Ok(vec![]);
        }

        let text = page.text.as_str();
        let mut pieces = Vec::new();
        self.split_span(text, 0..text.len(), 0, &mut pieces);

        let chunks = self
            .merge(text, pieces)
            .into_iter()
            .filter_map(|window| {
                let raw = &text[window.clone()];
                let trimmed = raw.trim();

                if trimmed.is_empty() {
                    return None;
                }

                let byte_start = window.start + (raw.len() - raw.trim_start().len());
                let start_index = text[..byte_start].chars().count();

                Some(Chunk::new(
                    trimmed,
                    ChunkMetadata::new(&page.source, page.page).with_start_index(start_index),
                ))
            })
            .collect();

        Ok(chunks)
    }

    fn kind(&self) -> ChunkingStrategyKind {
        ChunkingStrategyKind::Recursive
    }
}
