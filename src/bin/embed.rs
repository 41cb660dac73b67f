//! Embed binary entry point.
//!
//! This binary reads normalized records from the repository file, generates
//! embeddings in batches, and upserts them into the vector index keyed by
//! sanitized title.
//!
//! # Examples
//!
//! Embed the whole repository:
//! ```bash
//! OPENAI_API_KEY=sk-... PINECONE_API_KEY=pc-... \
//!   embed --index-host https://my-index.svc.pinecone.io
//! ```
//!
//! Resume from record 500:
//! ```bash
//! embed --index-host https://my-index.svc.pinecone.io --start 500
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use paper_harvester::{
    embedding::openai::{OpenAiConfig, OpenAiEmbedding},
    index::pinecone::{PineconeConfig, PineconeIndex},
    repository::{JsonFileRepository, PaperRepository},
    store::{EmbeddingStore, StoreStats},
    DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_MODEL,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Embed CLI for pushing repository records into the vector index
#[derive(Parser, Debug)]
#[command(
    name = "embed",
    version,
    about = "Embed repository records and upsert them into the vector index",
    long_about = "Reads records from the repository file, generates embeddings for each record \
                  with an abstract, and upserts the vectors (keyed by sanitized title) into the \
                  vector index. Requires OPENAI_API_KEY and PINECONE_API_KEY.

EXAMPLES:
  Embed the whole repository:
    embed --index-host https://my-index.svc.pinecone.io

  Resume from record 500 with smaller batches:
    embed --index-host https://my-index.svc.pinecone.io --start 500 --batch-size 25

  Use the large embedding model:
    embed --index-host https://my-index.svc.pinecone.io --model text-embedding-3-large"
)]
struct Args {
    /// Repository file to read records from
    #[arg(long, value_name = "FILE", default_value = "papers_repo.json")]
    repository: PathBuf,

    /// Vector index host URL
    #[arg(long, value_name = "URL", env = "PINECONE_INDEX_HOST")]
    index_host: String,

    /// Starting offset into the repository (skip records before it)
    #[arg(long, value_name = "N", default_value_t = 0)]
    start: usize,

    /// Number of records to embed and upsert per batch
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Embedding model name
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    model: String,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging subsystem with the specified level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Create a progress bar for tracking batches
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} records | Upserted: {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("##-"),
    );
    pb
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Starting embedding run");
    debug!("CLI arguments: {:?}", args);

    let openai_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY environment variable must be set")?;
    let pinecone_key = std::env::var("PINECONE_API_KEY")
        .context("PINECONE_API_KEY environment variable must be set")?;

    let embedding_config = OpenAiConfig::new(openai_key).with_model(&args.model);
    let dimension = embedding_config.dimension;
    let provider =
        OpenAiEmbedding::new(embedding_config).context("Failed to create embedding provider")?;
    info!(
        "Embedding provider initialized: model={}, dimension={}",
        args.model, dimension
    );

    let index = PineconeIndex::new(PineconeConfig::new(pinecone_key, &args.index_host, dimension))
        .context("Failed to create vector index client")?;
    let store = EmbeddingStore::new(provider, index);

    let repo = JsonFileRepository::new(&args.repository);
    let records = repo
        .read_all()
        .with_context(|| format!("Failed to read repository {}", args.repository.display()))?;
    info!(
        "Repository contains {} records ({})",
        records.len(),
        args.repository.display()
    );

    let pending = records.get(args.start..).unwrap_or_default();
    if pending.is_empty() {
        warn!(
            "Nothing to embed: start offset {} >= record count {}",
            args.start,
            records.len()
        );
        println!("Nothing to embed.");
        return Ok(());
    }

    let start_time = Instant::now();
    let progress = create_progress_bar(pending.len());
    progress.set_message("0");

    // Chunk here so progress advances per batch; the store still validates
    // dimensions before the first upsert of each call
    let mut totals = StoreStats::default();
    for batch in pending.chunks(args.batch_size.max(1)) {
        let stats = store
            .store_embeddings(batch, args.batch_size)
            .await
            .context("Embedding run aborted")?;
        totals.embedded += stats.embedded;
        totals.skipped += stats.skipped;
        totals.upserted += stats.upserted;
        totals.failed_batches += stats.failed_batches;
        progress.inc(batch.len() as u64);
        progress.set_message(format!("{}", totals.upserted));
    }
    progress.finish_with_message(format!("{}", totals.upserted));

    println!(
        "\nEmbedded {} records in {:.1}s: {} upserted, {} skipped (no abstract), {} failed batches",
        totals.embedded,
        start_time.elapsed().as_secs_f64(),
        totals.upserted,
        totals.skipped,
        totals.failed_batches
    );
    if totals.failed_batches > 0 {
        warn!(
            "{} batches failed to embed or upsert - check logs for details",
            totals.failed_batches
        );
    }

    Ok(())
}
