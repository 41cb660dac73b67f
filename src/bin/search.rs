//! Search binary entry point.
//!
//! This binary answers hybrid queries over the harvested papers: metadata
//! filtering on year/venue/title/author always applies, and a non-empty
//! query additionally narrows results by semantic similarity. It can also
//! export all stored vectors for offline analysis.
//!
//! # Examples
//!
//! Hybrid search:
//! ```bash
//! OPENAI_API_KEY=sk-... PINECONE_API_KEY=pc-... \
//!   search "graph neural networks" --index-host https://my-index.svc.pinecone.io
//! ```
//!
//! Metadata-only filtering (no query text):
//! ```bash
//! search --year 2024 --venue ICLR --index-host https://my-index.svc.pinecone.io
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use paper_harvester::{
    embedding::openai::{OpenAiConfig, OpenAiEmbedding},
    index::pinecone::{PineconeConfig, PineconeIndex},
    models::PaperRecord,
    query::{HybridQueryEngine, SearchRequest, FILTER_ALL},
    repository::{JsonFileRepository, PaperRepository},
    store::EmbeddingStore,
    DEFAULT_EMBEDDING_MODEL,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for search results
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-friendly table
    Table,
    /// Machine-readable JSON
    Json,
}

/// Search CLI for querying harvested papers
#[derive(Parser, Debug)]
#[command(
    name = "search",
    version,
    about = "Search harvested papers with metadata filters and semantic similarity",
    long_about = "Answers hybrid queries over the repository: exact year/venue filters and \
                  case-insensitive title/author substring matching always apply; a non-empty \
                  query additionally narrows results by embedding similarity. Requires \
                  OPENAI_API_KEY and PINECONE_API_KEY.

EXAMPLES:
  Hybrid search:
    search \"graph neural networks\" --index-host https://my-index.svc.pinecone.io

  Metadata-only filtering:
    search --year 2024 --venue ICLR --index-host https://...

  JSON output:
    search \"diffusion\" --format json --index-host https://...

  Export all stored vectors for offline analysis:
    search --dump-vectors vectors.json --index-host https://..."
)]
struct Args {
    /// Search query; omit for metadata-only filtering
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Exact venue-year filter ("All" = no constraint)
    #[arg(long, value_name = "YEAR", default_value = FILTER_ALL)]
    year: String,

    /// Exact venue-name filter ("All" = no constraint)
    #[arg(long, value_name = "VENUE", default_value = FILTER_ALL)]
    venue: String,

    /// Number of semantic matches requested from the index
    #[arg(long, value_name = "N", default_value_t = 10)]
    top_k: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Export all stored vectors to this JSON file and exit
    #[arg(long, value_name = "FILE", conflicts_with = "query")]
    dump_vectors: Option<PathBuf>,

    /// Repository file to read records from
    #[arg(long, value_name = "FILE", default_value = "papers_repo.json")]
    repository: PathBuf,

    /// Vector index host URL
    #[arg(long, value_name = "URL", env = "PINECONE_INDEX_HOST")]
    index_host: String,

    /// Embedding model name (must match what the index was built with)
    #[arg(long, value_name = "MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    model: String,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn truncated(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Format results as a pretty table
fn format_results_table(results: &[PaperRecord]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Authors").add_attribute(Attribute::Bold),
        Cell::new("Venue").add_attribute(Attribute::Bold),
        Cell::new("Year").add_attribute(Attribute::Bold),
        Cell::new("URL").add_attribute(Attribute::Bold),
    ]);

    for paper in results {
        table.add_row(vec![
            Cell::new(truncated(&paper.title, 60)),
            Cell::new(truncated(&paper.authors.join(", "), 40)),
            Cell::new(&paper.venue_name),
            Cell::new(&paper.venue_year),
            Cell::new(&paper.url),
        ]);
    }

    table.to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let openai_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY environment variable must be set")?;
    let pinecone_key = std::env::var("PINECONE_API_KEY")
        .context("PINECONE_API_KEY environment variable must be set")?;

    let embedding_config = OpenAiConfig::new(openai_key).with_model(&args.model);
    let dimension = embedding_config.dimension;
    let provider =
        OpenAiEmbedding::new(embedding_config).context("Failed to create embedding provider")?;
    let index = PineconeIndex::new(PineconeConfig::new(pinecone_key, &args.index_host, dimension))
        .context("Failed to create vector index client")?;
    let engine = HybridQueryEngine::new(EmbeddingStore::new(provider, index));

    if let Some(path) = &args.dump_vectors {
        info!("Exporting stored vectors to {}", path.display());
        let vectors = engine
            .store()
            .fetch_all_embeddings()
            .await
            .context("Failed to export stored vectors")?;
        let json = serde_json::to_string_pretty(&vectors)
            .context("Failed to serialize exported vectors")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Exported {} vectors to {}", vectors.len(), path.display());
        return Ok(());
    }

    let repo = JsonFileRepository::new(&args.repository);
    let records = repo
        .read_all()
        .with_context(|| format!("Failed to read repository {}", args.repository.display()))?;
    debug!("Repository contains {} records", records.len());

    let request = SearchRequest {
        query: args.query.clone().unwrap_or_default(),
        year: args.year.clone(),
        venue: args.venue.clone(),
        top_k: args.top_k,
    };

    let start = Instant::now();
    let results = engine
        .search(&records, &request)
        .await
        .context("Search failed")?;
    let elapsed = start.elapsed();

    match args.format {
        OutputFormat::Table => {
            println!("{}", format_results_table(&results));
            println!(
                "\nFound {} results in {:.2}s",
                results.len(),
                elapsed.as_secs_f64()
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&results)
                .context("Failed to serialize results to JSON")?;
            println!("{json}");
        }
    }

    Ok(())
}
