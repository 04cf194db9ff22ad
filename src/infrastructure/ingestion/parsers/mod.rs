//! Document parser implementations

mod docx;
mod pdf;

pub use docx::DocxParser;
pub use pdf::PdfParser;

#[cfg(test)]
pub(crate) use pdf::fixture::pdf_with_pages;
