//! Document parsing and chunking

mod chunkers;
mod engine;
mod factory;
mod parsers;

pub use chunkers::{FixedSizeChunker, RecursiveChunker, SemanticChunker};
pub use engine::ChunkingEngine;
pub use factory::{ChunkerFactory, ParserFactory};
pub use parsers::{DocxParser, PdfParser};

#[cfg(test)]
pub(crate) use parsers::pdf_with_pages;
