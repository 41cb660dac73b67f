//! Conference paper harvester - scraping, embedding and hybrid search.
//!
//! This library collects metadata about accepted conference papers from
//! heterogeneous sources (the arXiv API, the OpenReview API, HTML listing
//! pages), normalizes the records into a common schema, persists them, and
//! makes them searchable through keyword filters combined with
//! vector-embedding similarity search.
//!
//! # Architecture
//!
//! The system is organized into several key modules:
//!
//! - **models**: Core data structures (`PaperRecord`, sentinels)
//! - **fetch**: Per-source fetchers with bounded retry (arXiv, OpenReview)
//! - **scrape**: Venue scraping strategies and the venue-type factory
//! - **repository**: JSON-file persistence for normalized records
//! - **embedding**: Text embedding generation (OpenAI-compatible API)
//! - **index**: Vector index client (Pinecone-style upsert/query)
//! - **store**: Batched embedding storage and semantic retrieval
//! - **query**: Hybrid metadata + semantic search
//!
//! # Workflow
//!
//! ## Offline harvest
//!
//! 1. The scraper factory selects a venue strategy from a venue-type token
//! 2. The scraper discovers candidate papers and fills in abstracts/authors
//! 3. New records are appended to the paper repository (dedup by identifier)
//! 4. The embedding store batches records, embeds title + abstract, and
//!    upserts vectors keyed by the sanitized title
//!
//! ## Online search
//!
//! 1. Filter the record set by year/venue and query substring
//! 2. Embed the query and run nearest-neighbor search against the index
//! 3. Intersect the filtered set with the semantic matches by identifier
//!
//! # Example
//!
//! ```ignore
//! use paper_harvester::{
//!     embedding::openai::{OpenAiConfig, OpenAiEmbedding},
//!     index::pinecone::{PineconeConfig, PineconeIndex},
//!     query::{HybridQueryEngine, SearchRequest},
//!     repository::{JsonFileRepository, PaperRepository},
//!     store::EmbeddingStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = JsonFileRepository::new("papers_repo.json");
//!     let embedding = OpenAiEmbedding::new(OpenAiConfig::new(api_key))?;
//!     let index = PineconeIndex::new(PineconeConfig::new(pinecone_key, index_host, 1536))?;
//!     let engine = HybridQueryEngine::new(EmbeddingStore::new(embedding, index));
//!
//!     let records = repository.read_all()?;
//!     let request = SearchRequest {
//!         query: "graph neural networks".to_string(),
//!         year: "2024".to_string(),
//!         venue: "All".to_string(),
//!         top_k: 10,
//!     };
//!     for paper in engine.search(&records, &request).await? {
//!         println!("{} ({})", paper.title, paper.venue_year);
//!     }
//!     Ok(())
//! }
//! ```

pub mod embedding;
pub mod fetch;
pub mod index;
pub mod models;
pub mod query;
pub mod repository;
pub mod scrape;
pub mod store;

// Re-export commonly used types at the crate root
pub use embedding::{sanitize_key, EmbeddingProvider};
pub use fetch::{FetchedContent, RetryPolicy};
pub use index::{EmbeddingVector, ScoredMatch, VectorIndex, VectorMetadata};
pub use models::PaperRecord;
pub use query::{HybridQueryEngine, SearchRequest};
pub use repository::{JsonFileRepository, PaperRepository};
pub use scrape::{ScraperFactory, VenueScraper, VenueType};
pub use store::EmbeddingStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model name
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default embedding dimension for text-embedding-3-small
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Default number of records embedded and upserted per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// arXiv metadata API endpoint
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// OpenReview notes API endpoint
pub const OPENREVIEW_API_URL: &str = "https://api.openreview.net/notes";
