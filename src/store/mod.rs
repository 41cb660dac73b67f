//! Embedding store orchestration.
//!
//! [`EmbeddingStore`] sits between the embedding provider and the vector
//! index: it turns normalized paper records into vectors keyed by sanitized
//! title, pushes them upstream in batches, and answers semantic queries.
//!
//! Failure handling is deliberately two-tiered. A dimension mismatch between
//! provider and index is fatal before anything is written, because mixed
//! dimensions would poison the index. A single failed batch, by contrast, is
//! logged and skipped so the remaining batches still land.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::embedding::{sanitize_key, EmbeddingError, EmbeddingProvider};
use crate::index::{
    EmbeddingVector, IndexError, QueryOptions, ScoredMatch, VectorIndex, VectorMetadata,
};
use crate::models::PaperRecord;

/// Ceiling on vectors returned by a full-index export.
const EXPORT_CEILING: usize = 10_000;

/// Errors raised by the embedding store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Embedding provider failure
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Vector index failure
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Provider and index disagree on vector dimensionality
    #[error("embedding dimension {provider} does not match index dimension {index}")]
    DimensionMismatch {
        /// Dimension the provider produces
        provider: usize,
        /// Dimension the index was created with
        index: usize,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Counters summarizing one `store_embeddings` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Records embedded and handed to the index
    pub embedded: usize,

    /// Records skipped for lacking an abstract
    pub skipped: usize,

    /// Vectors the index acknowledged
    pub upserted: usize,

    /// Batches dropped after an embedding or upsert failure
    pub failed_batches: usize,
}

/// Orchestrates embedding generation and vector index writes.
pub struct EmbeddingStore<E, I> {
    provider: E,
    index: I,
}

impl<E: EmbeddingProvider, I: VectorIndex> EmbeddingStore<E, I> {
    /// Creates a store over a provider and an index.
    pub fn new(provider: E, index: I) -> Self {
        Self { provider, index }
    }

    /// Embeds a slice of texts, preserving input order.
    pub async fn generate_embeddings(&self, texts: &[&str]) -> StoreResult<Vec<Vec<f32>>> {
        Ok(self.provider.embed_batch(texts).await?)
    }

    /// Embeds `records` and upserts them in batches of `batch_size`.
    ///
    /// Records without an abstract are skipped. The vector key is the
    /// sanitized title; the embedding input is the sanitized title followed
    /// by the abstract. A failed batch is logged and skipped, but a
    /// dimension mismatch aborts before the first upsert.
    pub async fn store_embeddings(
        &self,
        records: &[PaperRecord],
        batch_size: usize,
    ) -> StoreResult<StoreStats> {
        if self.provider.dimension() != self.index.dimension() {
            return Err(StoreError::DimensionMismatch {
                provider: self.provider.dimension(),
                index: self.index.dimension(),
            });
        }

        let mut stats = StoreStats::default();
        let eligible: Vec<&PaperRecord> = records
            .iter()
            .filter(|r| {
                if r.has_abstract() {
                    true
                } else {
                    debug!(identifier = %r.identifier, "skipping record without abstract");
                    stats.skipped += 1;
                    false
                }
            })
            .collect();

        let batch_size = batch_size.max(1);
        for batch in eligible.chunks(batch_size) {
            let inputs: Vec<String> = batch
                .iter()
                .map(|r| format!("{} {}", sanitize_key(&r.title), r.abstract_text))
                .collect();
            let input_refs: Vec<&str> = inputs.iter().map(String::as_str).collect();

            let embeddings = match self.provider.embed_batch(&input_refs).await {
                Ok(embeddings) => embeddings,
                Err(err) => {
                    warn!(batch = batch.len(), error = %err, "embedding batch failed, skipping");
                    stats.failed_batches += 1;
                    continue;
                }
            };

            // A wrong-length vector would poison the index: stop everything.
            if let Some(bad) = embeddings.iter().find(|v| v.len() != self.index.dimension()) {
                return Err(StoreError::DimensionMismatch {
                    provider: bad.len(),
                    index: self.index.dimension(),
                });
            }

            let vectors: Vec<EmbeddingVector> = batch
                .iter()
                .zip(embeddings)
                .map(|(record, values)| EmbeddingVector {
                    id: sanitize_key(&record.title),
                    values,
                    metadata: Some(VectorMetadata {
                        url: record.url.clone(),
                        authors: record.authors.clone(),
                        venue_name: record.venue_name.clone(),
                        venue_year: record.venue_year.clone(),
                    }),
                })
                .collect();

            stats.embedded += vectors.len();
            match self.index.upsert(vectors).await {
                Ok(count) => stats.upserted += count,
                Err(err) => {
                    warn!(batch = batch.len(), error = %err, "index upsert failed, skipping batch");
                    stats.failed_batches += 1;
                }
            }
        }

        info!(
            embedded = stats.embedded,
            skipped = stats.skipped,
            upserted = stats.upserted,
            failed_batches = stats.failed_batches,
            "stored embeddings"
        );
        Ok(stats)
    }

    /// Embeds a free-text query and returns the closest stored papers,
    /// best match first.
    pub async fn semantic_search(
        &self,
        query: &str,
        top_k: usize,
    ) -> StoreResult<Vec<ScoredMatch>> {
        let vector = self.provider.embed(query).await?;
        let mut matches = self
            .index
            .query(
                &vector,
                top_k,
                QueryOptions {
                    include_values: false,
                    include_metadata: true,
                },
            )
            .await?;
        // Backends order by score already; enforce it so callers can rely on it
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    /// Exports stored vectors with values and metadata, up to the export
    /// ceiling, by querying with a zero vector.
    pub async fn fetch_all_embeddings(&self) -> StoreResult<Vec<ScoredMatch>> {
        let zero = vec![0.0f32; self.index.dimension()];
        let matches = self
            .index
            .query(
                &zero,
                EXPORT_CEILING,
                QueryOptions {
                    include_values: true,
                    include_metadata: true,
                },
            )
            .await?;
        info!(count = matches.len(), "exported stored embeddings");
        Ok(matches)
    }
}
