//! Uploaded document types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::DomainError;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
}

impl DocumentType {
    /// Infer the document type from the file extension
    pub fn from_filename(filename: &str) -> Result<Self, DomainError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(DomainError::invalid_argument(format!(
                "Unsupported file type for '{}': expected .pdf or .docx",
                filename
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            other => Err(DomainError::invalid_argument(format!(
                "Unknown document type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text of one page of a source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Source document filename
    pub source: String,
    /// Page number, 0-based
    pub page: u32,
    pub text: String,
}

impl PageText {
    pub fn new(source: impl Into<String>, page: u32, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
