//! `embed-codebase`: index a source tree into embedding artifacts.
//!
//! The embedding API is configured through `OPENAI_API_KEY` and, optionally,
//! `OPENAI_API_BASE`. Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use codeindex_embeddings::OpenAIProvider;
use codeindex_indexer::{EmbeddingIndexer, IndexerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "embed-codebase",
    version,
    about = "Embed a codebase into a vector array and a parallel metadata file"
)]
struct Cli {
    /// Logical identifier of the codebase; used to name the output files
    #[arg(long)]
    codebase_id: String,

    /// Root directory to scan
    #[arg(long)]
    codebase_path: PathBuf,

    /// Directory to write the output files into
    #[arg(long)]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let indexer =
        EmbeddingIndexer::new(Arc::new(OpenAIProvider::new()), IndexerConfig::default());
    let summary = indexer
        .run(&cli.codebase_id, &cli.codebase_path, &cli.output_dir)
        .await
        .with_context(|| format!("failed to index {}", cli.codebase_path.display()))?;

    info!(
        "Wrote {} and {}",
        summary.metadata_path.display(),
        summary.embeddings_path.display()
    );
    Ok(())
}
