//! Registry inspection commands

use clap::Args;

use super::print_json;
use crate::RagEngine;

#[derive(Args, Debug)]
pub struct KbsArgs {
    /// Only knowledge bases queryable with this embedding model
    #[arg(long)]
    pub compatible_with: Option<String>,
}

#[derive(Args, Debug)]
pub struct DocumentsArgs {
    /// Knowledge base name
    pub kb: String,
}

pub async fn run_list(engine: &RagEngine, args: KbsArgs) -> anyhow::Result<()> {
    let kbs = match args.compatible_with {
        Some(model) => engine.knowledge_bases.list_compatible(&model).await?,
        None => engine.knowledge_bases.list().await?,
    };

    print_json(&kbs)
}

pub async fn run_documents(engine: &RagEngine, args: DocumentsArgs) -> anyhow::Result<()> {
    let documents = engine.knowledge_bases.list_documents(&args.kb).await?;

    print_json(&documents)
}
