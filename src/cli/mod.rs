//! CLI module for PMP RAG Engine
//!
//! Subcommands:
//! - `ingest`: add a PDF or DOCX file to a knowledge base
//! - `query`: answer a question from one or more knowledge bases
//! - `ask`: answer a question without retrieval
//! - `kbs`, `documents`: inspect the registry

pub mod ingest;
pub mod knowledge_bases;
pub mod query;

use clap::{Parser, Subcommand};
use serde::Serialize;

/// PMP RAG Engine - question answering over document knowledge bases
#[derive(Parser)]
#[command(name = "pmp-rag-engine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest a document into a knowledge base
    Ingest(ingest::IngestArgs),

    /// Answer a question from the selected knowledge bases
    Query(query::QueryArgs),

    /// Answer a question directly, without retrieval
    Ask(query::AskArgs),

    /// List knowledge bases
    Kbs(knowledge_bases::KbsArgs),

    /// List the documents of a knowledge base
    Documents(knowledge_bases::DocumentsArgs),
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
