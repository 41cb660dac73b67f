//! OpenAI embedding provider implementation.
//!
//! Talks to OpenAI-compatible `/embeddings` endpoints over HTTP. Responses
//! are re-sorted by the per-entry index so output order always matches input
//! order regardless of how the API returns them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
use crate::{DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_RETRIES: usize = 3;

/// Configuration for the OpenAI embedding provider.
///
/// Constructed once per process and handed to [`OpenAiEmbedding::new`];
/// nothing here is read from global state.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for bearer authentication
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Model identifier (e.g. "text-embedding-3-small")
    pub model: String,

    /// Expected output dimension for the chosen model
    pub dimension: usize,

    /// Per-request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Default configuration for the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimension: DEFAULT_EMBEDDING_DIMENSION,
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the model, adjusting the dimension for known models.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimension = match self.model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => self.dimension,
        };
        self
    }
}

/// OpenAI embedding provider.
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    /// Builds a provider from an explicit configuration.
    pub fn new(config: OpenAiConfig) -> EmbeddingResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(EmbeddingError::ConfigError(
                "missing OpenAI API key".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| EmbeddingError::ConfigError("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model,
            dimension: config.dimension,
        })
    }

    async fn request_embeddings(&self, inputs: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
            };
            let response = self.client.post(&self.endpoint).json(&request).send().await;
            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp
                            .json()
                            .await
                            .map_err(|e| EmbeddingError::ApiError(e.to_string()))?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(EmbeddingError::ApiError(format!(
                                "API returned {} embeddings for {} inputs",
                                parsed.data.len(),
                                inputs.len()
                            )));
                        }
                        return Ok(parsed.data.into_iter().map(|e| e.embedding).collect());
                    }

                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < MAX_RETRIES {
                        attempt += 1;
                        warn!(%status, attempt, "embedding request failed, retrying");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(EmbeddingError::ApiError(format!(
                        "embedding request failed ({status}): {body}"
                    )));
                }
                Err(err) => {
                    let retryable = err.is_timeout() || err.is_connect() || err.is_request();
                    if retryable && attempt + 1 < MAX_RETRIES {
                        attempt += 1;
                        warn!(error = %err, attempt, "embedding request failed, retrying");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(EmbeddingError::ApiError(err.to_string()));
                }
            }
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "text cannot be empty".to_string(),
            ));
        }
        let mut embeddings = self.request_embeddings(&[text]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::ApiError("API returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_embeddings(texts).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::new("sk-test");
        assert_eq!(config.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.dimension, DEFAULT_EMBEDDING_DIMENSION);
    }

    #[test]
    fn test_with_model_adjusts_dimension() {
        let config = OpenAiConfig::new("sk-test").with_model("text-embedding-3-large");
        assert_eq!(config.dimension, 3072);

        let config = OpenAiConfig::new("sk-test").with_model("some-custom-model");
        assert_eq!(config.dimension, DEFAULT_EMBEDDING_DIMENSION);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiEmbedding::new(OpenAiConfig::new("   "));
        assert!(matches!(result, Err(EmbeddingError::ConfigError(_))));
    }

    #[test]
    fn test_provider_reports_model_and_dimension() {
        let provider = OpenAiEmbedding::new(OpenAiConfig::new("sk-test")).unwrap();
        assert_eq!(provider.model_name(), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(provider.dimension(), DEFAULT_EMBEDDING_DIMENSION);
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_text() {
        let provider = OpenAiEmbedding::new(OpenAiConfig::new("sk-test")).unwrap();
        let result = provider.embed("   ").await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_embed_batch_empty_input_short_circuits() {
        let provider = OpenAiEmbedding::new(OpenAiConfig::new("sk-test")).unwrap();
        let result = provider.embed_batch(&[]).await.unwrap();
        assert!(result.is_empty());
    }
}
