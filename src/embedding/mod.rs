//! Embedding provider abstraction and implementations.
//!
//! This module defines the interface for text embedding generation and the
//! key sanitization rule shared by storage and lookup. The abstraction
//! allows the pipeline to swap embedding models without changing the store
//! or query logic.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Placeholder substituted for characters outside the printable ASCII range.
const KEY_PLACEHOLDER: char = '?';

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Network or API communication error
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Invalid input text (e.g., empty, too long)
    #[error("Invalid input text: {0}")]
    InvalidInput(String),

    /// Configuration error (e.g., missing API key)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Other unexpected errors
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Trait for text embedding providers.
///
/// Implementors generate vector embeddings from text inputs. The trait is
/// async to support API-based embedding services.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for the given text.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Generate embeddings for multiple texts in a single batch.
    ///
    /// Output order matches input order; an empty input yields an empty
    /// output without touching the remote service.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Dimension of the vectors produced by this provider.
    fn dimension(&self) -> usize;

    /// Model name/identifier for this provider.
    fn model_name(&self) -> &str;
}

/// Sanitizes a string for use as a vector-index key.
///
/// Every character outside the printable ASCII range (0x20..=0x7E) is
/// replaced with `?`. The transformation is idempotent, so the same title
/// always maps to the same key whether it is being stored or looked up.
pub fn sanitize_key(text: &str) -> String {
    text.chars()
        .map(|ch| {
            if (' '..='~').contains(&ch) {
                ch
            } else {
                KEY_PLACEHOLDER
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key_replaces_non_ascii() {
        assert_eq!(sanitize_key("Schrödinger Bridge"), "Schr?dinger Bridge");
        assert_eq!(sanitize_key("naïve—model"), "na?ve?model");
        assert_eq!(sanitize_key("plain ascii."), "plain ascii.");
    }

    #[test]
    fn test_sanitize_key_replaces_control_characters() {
        assert_eq!(sanitize_key("tab\there"), "tab?here");
        assert_eq!(sanitize_key("line\nbreak"), "line?break");
    }

    #[test]
    fn test_sanitize_key_is_idempotent() {
        let inputs = [
            "Schrödinger Bridge",
            "plain",
            "",
            "émigré café\u{1F600}",
            "mixed – dashes — and quotes “”",
        ];
        for input in inputs {
            let once = sanitize_key(input);
            assert_eq!(sanitize_key(&once), once);
        }
    }

    #[test]
    fn test_sanitize_key_output_is_printable_ascii() {
        let sanitized = sanitize_key("控制\u{7}字符 mixed with text");
        assert!(sanitized.chars().all(|c| (' '..='~').contains(&c)));
    }
}
