//! DOCX document parser

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read};

use crate::domain::ingestion::{DocumentParser, DocumentType, PageText};
use crate::domain::DomainError;

const DOCUMENT_XML: &str = "word/document.xml";

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:br\b[^>]*w:type="page"[^>]*/>|<w:lastRenderedPageBreak\s*/>|<w:tab\s*/>|</w:p>"#,
    )
    .expect("valid regex")
});

/// Reads paragraphs from `word/document.xml`, starting a new page at each
/// explicit or rendered page break
#[derive(Debug, Clone, Default)]
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }

    fn read_document_xml(filename: &str, bytes: &[u8]) -> Result<String, DomainError> {
        let invalid = |e: &dyn std::fmt::Display| {
            DomainError::invalid_argument(format!("Failed to read DOCX '{}': {}", filename, e))
        };

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| invalid(&e))?;
        let mut entry = archive.by_name(DOCUMENT_XML).map_err(|e| invalid(&e))?;

        let mut xml = String::new();
        entry.read_to_string(&mut xml).map_err(|e| invalid(&e))?;

        Ok(xml)
    }
}

static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(lt|gt|quot|apos|amp|#[0-9]+|#x[0-9a-fA-F]+);").expect("valid regex")
});

/// Decode predefined and numeric character references in one pass
fn unescape_xml(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| entity[1..].parse())
                    .ok()
                    .and_then(char::from_u32),
            };

            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Split document XML into page texts
fn pages_from_xml(xml: &str) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();

    for caps in TOKEN_REGEX.captures_iter(xml) {
        if let Some(text) = caps.get(1) {
            current.push_str(&unescape_xml(text.as_str()));
            continue;
        }

        match caps.get(0).map(|m| m.as_str()) {
            Some("</w:p>") => current.push('\n'),
            Some(token) if token.starts_with("<w:tab") => current.push('\t'),
            Some(_) => {
                // Consecutive breaks do not produce empty pages
                if !current.trim().is_empty() {
                    pages.push(std::mem::take(&mut current));
                }
            }
            None => {}
        }
    }

    if !current.trim().is_empty() || pages.is_empty() {
        pages.push(current);
    }

    pages
}

#[async_trait]
impl DocumentParser for DocxParser {
    fn document_type(&self) -> DocumentType {
        DocumentType::Docx
    }

    async fn parse(&self, filename: &str, bytes: &[u8]) -> Result<Vec<PageText>, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::invalid_argument(format!(
                "File '{}' is empty",
                filename
            )));
        }

        let xml = Self::read_document_xml(filename, bytes)?;
        let pages = pages_from_xml(&xml)
            .into_iter()
            .enumerate()
            .map(|(idx, text)| PageText::new(filename, idx as u32, text.trim_end()))
            .collect::<Vec<_>>();

        tracing::debug!(filename, page_count = pages.len(), "Extracted text from DOCX");

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_XML, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn para(text: &str) -> String {
        format!(r#"<w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
    }

    const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_xml("a &lt;b&gt; &amp;amp; &quot;c&quot;"), "a <b> &amp; \"c\"");
    }

    #[test]
    fn test_unescape_numeric_references() {
        assert_eq!(unescape_xml("it&#8217;s &#x2019;q&#X41;"), "it\u{2019}s \u{2019}q&#X41;");
        assert_eq!(unescape_xml("&#65;&#x42;"), "AB");
        assert_eq!(unescape_xml("&amp;#65;"), "&#65;");
        assert_eq!(unescape_xml("bad &#xD800; &#99999999999;"), "bad &#xD800; &#99999999999;");
    }

    #[tokio::test]
    async fn test_paragraphs_on_one_page() {
        let bytes = docx(&format!("{}{}", para("Hello"), para("World &amp; more")));

        let pages = DocxParser::new().parse("notes.docx", &bytes).await.unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "Hello\nWorld & more");
        assert_eq!(pages[0].source, "notes.docx");
    }

    #[tokio::test]
    async fn test_page_breaks_split_pages() {
        let body = format!(
            "{}{}{}{}{}",
            para("Page one"),
            PAGE_BREAK,
            para("Page two"),
            PAGE_BREAK,
            para("Page three")
        );
        let bytes = docx(&body);

        let pages = DocxParser::new().parse("guide.docx", &bytes).await.unwrap();
        let texts: Vec<&str> = pages.iter().map(|p| p.text.trim()).collect();

        assert_eq!(texts, vec!["Page one", "Page two", "Page three"]);
        assert_eq!(pages[2].page, 2);
    }

    #[tokio::test]
    async fn test_not_a_zip() {
        let result = DocxParser::new().parse("bad.docx", b"plain text").await;

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_empty_bytes_rejected() {
        let result = DocxParser::new().parse("empty.docx", &[]).await;

        assert!(matches!(result, Err(DomainError::InvalidArgument { .. })));
    }
}
