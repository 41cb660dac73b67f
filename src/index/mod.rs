//! Vector index abstraction and implementations.
//!
//! This module defines the narrow interface the embedding store needs from
//! an external vector index: batch upsert of `{id, values, metadata}`
//! triples and nearest-neighbor query. A backend response with no matches
//! structure at all is normalized to an empty match list, so callers never
//! branch on the presence of a `matches` field.

pub mod pinecone;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during vector index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Network or API communication error
    #[error("index request failed: {0}")]
    ApiError(String),

    /// Configuration error (missing key, bad host)
    #[error("index configuration error: {0}")]
    ConfigError(String),

    /// Other unexpected errors
    #[error("unexpected index error: {0}")]
    Other(String),
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// Canonical link to the paper's page
    pub url: String,

    /// Author display names
    #[serde(default)]
    pub authors: Vec<String>,

    /// Conference acronym
    pub venue_name: String,

    /// Conference year
    pub venue_year: String,
}

/// One vector as stored in (or exported from) the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// Sanitized key, the index's primary key
    pub id: String,

    /// Embedding values; length is fixed at index-creation time
    pub values: Vec<f32>,

    /// Paper metadata carried with the vector
    pub metadata: Option<VectorMetadata>,
}

/// One ranked match from a nearest-neighbor query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    /// Vector key
    pub id: String,

    /// Similarity score, higher is closer
    pub score: f32,

    /// Vector values, present only when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,

    /// Vector metadata, present only when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VectorMetadata>,
}

/// Options controlling what a query returns beyond ids and scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Return stored vector values with each match
    pub include_values: bool,

    /// Return stored metadata with each match
    pub include_metadata: bool,
}

/// Trait for vector index backends.
///
/// Upsert semantics are insert-or-overwrite keyed by `id`: re-storing a
/// vector under an existing key replaces its values and metadata.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upserts a batch of vectors as one unit, returning how many the
    /// backend accepted.
    async fn upsert(&self, vectors: Vec<EmbeddingVector>) -> IndexResult<usize>;

    /// Runs a nearest-neighbor query, returning up to `top_k` matches
    /// ordered by descending score. A missing matches structure in the
    /// backend response yields an empty vec, not an error.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        options: QueryOptions,
    ) -> IndexResult<Vec<ScoredMatch>>;

    /// Vector dimensionality fixed at index creation.
    fn dimension(&self) -> usize;
}
