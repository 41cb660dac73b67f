//! Pinecone vector index client.
//!
//! Minimal HTTP client for a serverless Pinecone index: `/vectors/upsert`
//! and `/query` against the index host, authenticated with the `Api-Key`
//! header. Only the operations the embedding store needs are implemented.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    EmbeddingVector, IndexError, IndexResult, QueryOptions, ScoredMatch, VectorIndex,
    VectorMetadata,
};

/// Configuration for a Pinecone index client.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    /// API key sent in the `Api-Key` header
    pub api_key: String,

    /// Index host, e.g. `https://ml-conferences-abc123.svc.pinecone.io`
    pub index_host: String,

    /// Vector dimension the index was created with
    pub dimension: usize,

    /// Per-request timeout
    pub timeout: Duration,
}

impl PineconeConfig {
    /// Builds a configuration with the default timeout.
    pub fn new(
        api_key: impl Into<String>,
        index_host: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            index_host: index_host.into(),
            dimension,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for one Pinecone index.
pub struct PineconeIndex {
    client: reqwest::Client,
    base_url: String,
    dimension: usize,
}

impl PineconeIndex {
    /// Builds a client from an explicit configuration.
    pub fn new(config: PineconeConfig) -> IndexResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(IndexError::ConfigError(
                "missing Pinecone API key".to_string(),
            ));
        }
        if !config.index_host.starts_with("http://") && !config.index_host.starts_with("https://")
        {
            return Err(IndexError::ConfigError(
                "Pinecone index host must be an http(s) URL".to_string(),
            ));
        }
        if config.dimension == 0 {
            return Err(IndexError::ConfigError(
                "index dimension must be non-zero".to_string(),
            ));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Api-Key",
            reqwest::header::HeaderValue::from_str(config.api_key.trim())
                .map_err(|_| IndexError::ConfigError("invalid Pinecone API key".to_string()))?,
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| IndexError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.index_host.trim_end_matches('/').to_string(),
            dimension: config.dimension,
        })
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> IndexResult<R> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| IndexError::ApiError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(IndexError::ApiError(format!(
                "request to {path} failed ({status}): {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| IndexError::ApiError(e.to_string()))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, vectors: Vec<EmbeddingVector>) -> IndexResult<usize> {
        if vectors.is_empty() {
            return Ok(0);
        }
        debug!(count = vectors.len(), "upserting vectors");
        let request = UpsertRequest { vectors };
        let response: UpsertResponse = self.post("/vectors/upsert", &request).await?;
        Ok(response.upserted_count)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        options: QueryOptions,
    ) -> IndexResult<Vec<ScoredMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_values: options.include_values,
            include_metadata: options.include_metadata,
        };
        let response: QueryResponse = self.post("/query", &request).await?;
        let matches = match response.matches {
            Some(matches) => matches,
            None => {
                // Transient backend states can omit the matches structure
                warn!("index query returned no matches structure, treating as empty");
                Vec::new()
            }
        };
        Ok(matches
            .into_iter()
            .map(|m| ScoredMatch {
                id: m.id,
                score: m.score,
                values: m.values,
                metadata: m.metadata,
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<EmbeddingVector>,
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeValues")]
    include_values: bool,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    matches: Option<Vec<QueryMatch>>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    values: Option<Vec<f32>>,
    #[serde(default)]
    metadata: Option<VectorMetadata>,
}
