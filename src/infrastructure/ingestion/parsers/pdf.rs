//! PDF document parser

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::ingestion::{DocumentParser, DocumentType, PageText};
use crate::domain::DomainError;

/// Extracts one text per PDF page using lopdf
#[derive(Debug, Clone, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PdfParser {
    fn document_type(&self) -> DocumentType {
        DocumentType::Pdf
    }

    async fn parse(&self, filename: &str, bytes: &[u8]) -> Result<Vec<PageText>, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::invalid_argument(format!(
                "File '{}' is empty",
                filename
            )));
        }

        let filename = filename.to_string();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || extract_pages(&filename, &bytes))
            .await
            .map_err(|e| DomainError::internal(format!("PDF extraction task failed: {}", e)))?
    }
}

fn extract_pages(filename: &str, bytes: &[u8]) -> Result<Vec<PageText>, DomainError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| {
        DomainError::invalid_argument(format!("Failed to load PDF '{}': {}", filename, e))
    })?;

    let pages = doc.get_pages();
    debug!(filename, page_count = pages.len(), "Extracting text from PDF");

    let texts = pages
        .keys()
        .enumerate()
        .map(|(idx, page_num)| {
            let text = doc.extract_text(&[*page_num]).unwrap_or_else(|e| {
                warn!(filename, page = page_num, error = %e, "Failed to extract page text");
                String::new()
            });

            PageText::new(filename, idx as u32, text)
        })
        .collect();

    Ok(texts)
}
