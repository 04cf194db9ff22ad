//! Query and ask commands

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use super::print_json;
use crate::domain::Message;
use crate::infrastructure::services::QueryRequest;
use crate::RagEngine;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// The question
    pub query: String,

    /// Knowledge base to search; repeat for several
    #[arg(long = "kb", required = true)]
    pub kbs: Vec<String>,

    #[arg(long)]
    pub embedding_model: String,

    #[arg(long, default_value = "gpt-4o-mini")]
    pub chat_model: String,

    /// Hits per knowledge base
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Also print per-KB answers and sources
    #[arg(long)]
    pub verbose: bool,

    /// JSON file of prior `{"role", "content"}` turns
    #[arg(long)]
    pub history: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question
    pub query: String,

    #[arg(long, default_value = "gpt-4o-mini")]
    pub chat_model: String,

    /// JSON file of prior `{"role", "content"}` turns
    #[arg(long)]
    pub history: Option<PathBuf>,
}

async fn load_history(path: Option<&Path>) -> anyhow::Result<Vec<Message>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read history file {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid history file {}", path.display()))
}

pub async fn run_query(engine: &RagEngine, args: QueryArgs) -> anyhow::Result<()> {
    let mut request = QueryRequest::new(
        args.query,
        args.kbs,
        args.embedding_model,
        args.chat_model,
    )
    .with_history(load_history(args.history.as_deref()).await?);
    if let Some(top_k) = args.top_k {
        request = request.with_top_k(top_k);
    }

    let answer = engine.queries.query(&request).await;

    if args.verbose {
        print_json(&answer)
    } else {
        print_json(&answer.to_response())
    }
}

pub async fn run_ask(engine: &RagEngine, args: AskArgs) -> anyhow::Result<()> {
    let history = load_history(args.history.as_deref()).await?;
    let answer = engine
        .queries
        .answer_direct(&args.query, &args.chat_model, &history)
        .await?;

    print_json(&answer.to_response())
}
