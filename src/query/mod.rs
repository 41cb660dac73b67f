//! Hybrid metadata and semantic query engine.
//!
//! A search runs in two steps. Metadata filtering always happens: exact
//! match on year and venue (the `All` sentinel lifts a constraint) plus
//! case-insensitive substring match of the query against titles and
//! authors. When the query text is non-empty, a semantic search narrows
//! that filtered set further by sanitized-title membership.
//!
//! The intersection is set membership only, so results keep repository
//! stored order rather than semantic rank order.

use std::collections::HashSet;

use tracing::debug;

use crate::embedding::{sanitize_key, EmbeddingProvider};
use crate::index::VectorIndex;
use crate::models::PaperRecord;
use crate::store::{EmbeddingStore, StoreResult};

/// Sentinel filter value meaning "no constraint on this dimension".
pub const FILTER_ALL: &str = "All";

/// One search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free-text query; empty means metadata filtering only
    pub query: String,

    /// Exact venue-year filter, or [`FILTER_ALL`]
    pub year: String,

    /// Exact venue-name filter, or [`FILTER_ALL`]
    pub venue: String,

    /// Semantic result cap passed to the vector index
    pub top_k: usize,
}

impl SearchRequest {
    /// Request matching everything, with the given semantic cap.
    pub fn unconstrained(top_k: usize) -> Self {
        Self {
            query: String::new(),
            year: FILTER_ALL.to_string(),
            venue: FILTER_ALL.to_string(),
            top_k,
        }
    }
}

/// Filters records by year, venue and query substring, preserving order.
pub fn filter_records(records: &[PaperRecord], request: &SearchRequest) -> Vec<PaperRecord> {
    let needle = request.query.trim().to_lowercase();
    records
        .iter()
        .filter(|r| dimension_matches(&r.venue_year, &request.year))
        .filter(|r| dimension_matches(&r.venue_name, &request.venue))
        .filter(|r| text_matches(r, &needle))
        .cloned()
        .collect()
}

fn dimension_matches(value: &str, filter: &str) -> bool {
    filter == FILTER_ALL || value == filter
}

/// Case-insensitive substring match on title or any author name. An empty
/// needle matches every record.
fn text_matches(record: &PaperRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record.title.to_lowercase().contains(needle)
        || record
            .authors
            .iter()
            .any(|a| a.to_lowercase().contains(needle))
}

/// Composes metadata filtering with semantic narrowing.
pub struct HybridQueryEngine<E, I> {
    store: EmbeddingStore<E, I>,
}

impl<E: EmbeddingProvider, I: VectorIndex> HybridQueryEngine<E, I> {
    /// Creates an engine over an embedding store.
    pub fn new(store: EmbeddingStore<E, I>) -> Self {
        Self { store }
    }

    /// The underlying embedding store.
    pub fn store(&self) -> &EmbeddingStore<E, I> {
        &self.store
    }

    /// Answers one search request against the given record set.
    ///
    /// With an empty query this is pure metadata filtering. With a
    /// non-empty query the filtered set is intersected with the semantic
    /// result set by sanitized title, keeping stored order.
    pub async fn search(
        &self,
        records: &[PaperRecord],
        request: &SearchRequest,
    ) -> StoreResult<Vec<PaperRecord>> {
        let filtered = filter_records(records, request);
        if request.query.trim().is_empty() {
            return Ok(filtered);
        }

        let matches = self
            .store
            .semantic_search(&request.query, request.top_k)
            .await?;
        let semantic_keys: HashSet<String> = matches.into_iter().map(|m| m.id).collect();
        debug!(
            filtered = filtered.len(),
            semantic = semantic_keys.len(),
            "intersecting metadata and semantic results"
        );

        Ok(filtered
            .into_iter()
            .filter(|r| semantic_keys.contains(&sanitize_key(&r.title)))
            .collect())
    }
}
