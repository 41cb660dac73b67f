//! Core data models for the paper harvester.
//!
//! This module contains the canonical record shape shared by every scraper,
//! the repository, and the embedding pipeline, plus the sentinel values used
//! when a source could not supply a field.

use serde::{Deserialize, Serialize};

/// Sentinel stored when a source could not supply an abstract.
pub const NO_ABSTRACT: &str = "No abstract available";

/// Sentinel stored when a source could not supply a field (title, author).
pub const UNKNOWN: &str = "unknown";

/// Canonical metadata for one conference paper.
///
/// Every scraper variant produces this shape, the repository persists it,
/// and the embedding store derives exactly one vector from it. `identifier`
/// is the stable unique key within the repository: the source-assigned ID
/// (e.g. an arXiv ID or OpenReview note ID) where one exists, otherwise a
/// slug derived from the title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Stable unique key, immutable once assigned
    pub identifier: String,

    /// Paper title (non-empty)
    pub title: String,

    /// Author display names in listing order; may be empty if unknown
    #[serde(default)]
    pub authors: Vec<String>,

    /// Abstract text, or [`NO_ABSTRACT`] when the source fetch failed
    pub abstract_text: String,

    /// Canonical link to the paper's page
    pub url: String,

    /// Conference acronym (e.g. "ICCV")
    pub venue_name: String,

    /// Conference year as listed (kept as a string)
    pub venue_year: String,
}

impl PaperRecord {
    /// Whether the record carries a real abstract.
    ///
    /// Records whose abstract fetch failed are still persisted (partial data
    /// is allowed) but are skipped by embedding generation.
    pub fn has_abstract(&self) -> bool {
        !self.abstract_text.trim().is_empty() && self.abstract_text != NO_ABSTRACT
    }
}
