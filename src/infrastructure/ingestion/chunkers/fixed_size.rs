//! Fixed-size chunking strategy

use async_trait::async_trait;

use crate::domain::ingestion::{
    Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy, ChunkingStrategyKind, PageText,
};
use crate::domain::DomainError;

/// Naive character windows of `chunk_size`, overlapping by `chunk_overlap`
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    config: ChunkingConfig,
}

impl FixedSizeChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Character windows as (char offset, text)
    fn windows<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        // Byte offset of every char boundary, including the end
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        let step = self.config.chunk_size - self.config.chunk_overlap;

        let mut windows = Vec::new();
        let mut start = 0;

        while start < char_count {
            let end = (start + self.config.chunk_size).min(char_count);
            windows.push((start, &text[boundaries[start]..boundaries[end]]));

            if end == char_count {
                break;
            }

            start += step;
        }

        windows
    }
}

#[async_trait]
impl ChunkingStrategy for FixedSizeChunker {
    async fn split(&self, page: &PageText) -> Result<Vec<Chunk>, DomainError> {
        if page.is_blank() {
            return Ok(vec![]);
        }

        Ok(self
            .windows(&page.text)
            .into_iter()
            .map(|(start, text)| {
                Chunk::new(
                    text,
                    ChunkMetadata::new(&page.source, page.page).with_start_index(start),
                )
            })
            .collect())
    }

    fn kind(&self) -> ChunkingStrategyKind {
        ChunkingStrategyKind::Fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> FixedSizeChunker {
        FixedSizeChunker::new(ChunkingConfig::new(size, overlap)).unwrap()
    }

    fn page(text: &str) -> PageText {
        PageText::new("doc.pdf", 2, text)
    }

    #[tokio::test]
    async fn test_blank_page_yields_nothing() {
        let chunks = chunker(10, 2).split(&page("  \n ")).await.unwrap();

        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_windows_and_overlap() {
        let chunks = chunker(6, 2).split(&page("abcdefghijklmnop")).await.unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        assert_eq!(texts, vec!["abcdef", "efghij", "ijklmn", "mnop"]);
        assert_eq!(chunks[1].metadata.start_index, Some(4));
        assert!(chunks.iter().all(|c| c.page() == 2 && c.source() == "doc.pdf"));
    }

    #[tokio::test]
    async fn test_windows_reconstruct_text() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(7);
        let (size, overlap) = (50, 10);
        let chunks = chunker(size, overlap).split(&page(&text)).await.unwrap();

        let mut rebuilt = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i + 1 == chunks.len() {
                rebuilt.push_str(&chunk.text);
            } else {
                rebuilt.extend(chunk.text.chars().take(size - overlap));
            }
        }

        assert_eq!(rebuilt, text);
    }

    #[tokio::test]
    async fn test_chunk_count_non_increasing_in_size() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let mut previous = usize::MAX;

        for size in [20, 40, 80, 160, 320, 2000] {
            let count = chunker(size, 10).split(&page(&text)).await.unwrap().len();
            assert!(count <= previous, "size {} produced {} chunks", size, count);
            previous = count;
        }
    }

    #[tokio::test]
    async fn test_multibyte_text_is_split_on_chars() {
        let chunks = chunker(3, 1).split(&page("héllø wörld")).await.unwrap();

        assert_eq!(chunks[0].text, "hél");
        assert_eq!(chunks[1].text, "llø");
    }

    #[test]
    fn test_invalid_config() {
        assert!(FixedSizeChunker::new(ChunkingConfig::new(0, 0)).is_err());
        assert!(FixedSizeChunker::new(ChunkingConfig::new(10, 10)).is_err());
    }
}
