//! Document parser trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::{DocumentType, PageText};
use crate::domain::DomainError;

/// Extracts per-page text from an uploaded file
#[async_trait]
pub trait DocumentParser: Send + Sync + Debug {
    /// The format this parser reads
    fn document_type(&self) -> DocumentType;

    /// Parse raw file bytes into pages, in document order.
    ///
    /// Empty input is an `InvalidArgument`; unreadable content is reported
    /// the same way so the caller sees the file name in the error.
    async fn parse(&self, filename: &str, bytes: &[u8]) -> Result<Vec<PageText>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Parser returning fixed page texts regardless of input bytes
    #[derive(Debug)]
    pub struct MockDocumentParser {
        document_type: DocumentType,
        pages: Vec<String>,
    }

    impl MockDocumentParser {
        pub fn new(document_type: DocumentType, pages: Vec<&str>) -> Self {
            Self {
                document_type,
                pages: pages.into_iter().map(String::from).collect(),
            }
        }
    }

    #[async_trait]
    impl DocumentParser for MockDocumentParser {
        fn document_type(&self) -> DocumentType {
            self.document_type
        }

        async fn parse(
            &self,
            filename: &str,
            bytes: &[u8],
        ) -> Result<Vec<PageText>, DomainError> {
            if bytes.is_empty() {
                return Err(DomainError::invalid_argument(format!(
                    "File '{}' is empty",
                    filename
                )));
            }

            Ok(self
                .pages
                .iter()
                .enumerate()
                .map(|(i, text)| PageText::new(filename, i as u32, text.clone()))
                .collect())
        }
    }
}
