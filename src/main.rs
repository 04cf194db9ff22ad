use clap::Parser;
use pmp_rag_engine::cli::{self, Cli, Command};
use pmp_rag_engine::infrastructure::logging::init_logging;
use pmp_rag_engine::{AppConfig, RagEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging);

    let engine = RagEngine::from_config(&config).await?;

    match cli.command {
        Command::Ingest(args) => cli::ingest::run(&engine, &config, args).await,
        Command::Query(args) => cli::query::run_query(&engine, args).await,
        Command::Ask(args) => cli::query::run_ask(&engine, args).await,
        Command::Kbs(args) => cli::knowledge_bases::run_list(&engine, args).await,
        Command::Documents(args) => cli::knowledge_bases::run_documents(&engine, args).await,
    }
}
