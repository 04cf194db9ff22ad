//! Ingest command - add one file to a knowledge base

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::print_json;
use crate::config::AppConfig;
use crate::domain::{IngestReport, IngestRequest, KnowledgeBaseName};
use crate::RagEngine;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// PDF or DOCX file to ingest
    pub file: PathBuf,

    /// Target knowledge base; defaults to `kb_<file stem>`
    #[arg(long)]
    pub kb: Option<String>,

    /// Embedding model, e.g. text-embedding-3-small or llama3.2
    #[arg(long)]
    pub embedding_model: String,

    /// Chunking strategy: fixed, recursive, semantic_percentile,
    /// semantic_interquartile or semantic_std_dev
    #[arg(long, default_value = "recursive")]
    pub strategy: String,

    #[arg(long)]
    pub chunk_size: Option<usize>,

    #[arg(long)]
    pub chunk_overlap: Option<usize>,
}

pub async fn run(engine: &RagEngine, config: &AppConfig, args: IngestArgs) -> anyhow::Result<()> {
    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Invalid file path '{}'", args.file.display()))?;

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read '{}'", args.file.display()))?;

    let kb_name = match args.kb {
        Some(kb) => kb,
        None => KnowledgeBaseName::from_filename(&filename)?.to_string(),
    };

    let request = IngestRequest::new(
        filename,
        bytes,
        kb_name,
        args.embedding_model,
        args.strategy,
    )
    .with_chunking(
        args.chunk_size.unwrap_or(config.chunking.chunk_size),
        args.chunk_overlap.unwrap_or(config.chunking.chunk_overlap),
    );

    let report = IngestReport::from(engine.ingestion.ingest(request).await);
    print_json(&report)?;

    if let IngestReport::Error { message } = report {
        anyhow::bail!(message);
    }

    Ok(())
}
