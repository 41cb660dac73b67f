//! OpenReview venue-listing fetcher.
//!
//! Unlike the per-paper arXiv fetcher, OpenReview exposes a venue's whole
//! accepted-submission listing in one call, so no secondary per-paper lookup
//! is needed. Submissions with missing fields are kept, with explicit
//! placeholder values substituted.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{get_with_retry, FetchResult, HttpTransport, ReqwestTransport, RetryPolicy};
use crate::models::{NO_ABSTRACT, UNKNOWN};
use crate::OPENREVIEW_API_URL;

/// One partial submission from a venue listing.
///
/// Venue name and year are not part of the listing payload; the API-listing
/// scraper fills those in when mapping submissions into full records.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Stable identifier (the OpenReview note ID, or a title slug)
    pub identifier: String,

    /// Title, or the `unknown` placeholder
    pub title: String,

    /// Abstract, or the `No abstract available` placeholder
    pub abstract_text: String,

    /// Author display names in listing order
    pub authors: Vec<String>,

    /// Canonical forum URL for the submission
    pub url: String,
}

/// Fetcher for OpenReview venue listings.
pub struct OpenReviewFetcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenReviewFetcher {
    /// Creates a fetcher against the public OpenReview API.
    pub fn new() -> FetchResult<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(30))?;
        Ok(Self::with_transport(
            Arc::new(transport),
            OPENREVIEW_API_URL,
            RetryPolicy::default(),
        ))
    }

    /// Creates a fetcher with an explicit transport, endpoint and policy.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            retry,
        }
    }

    /// Fetches the accepted submissions for `venue_id`, optionally capped.
    ///
    /// Missing per-submission fields are substituted with placeholders
    /// rather than dropping the submission. A transport or parse failure on
    /// the listing itself is an error; the caller decides how to degrade.
    pub async fn fetch_accepted_submissions(
        &self,
        venue_id: &str,
        limit: Option<usize>,
    ) -> FetchResult<Vec<Submission>> {
        debug!(venue_id, ?limit, "fetching venue listing from OpenReview");
        let mut url = format!("{}?content.venueid={}", self.base_url, venue_id);
        if let Some(limit) = limit {
            url.push_str(&format!("&limit={limit}"));
        }

        let body = get_with_retry(self.transport.as_ref(), &url, self.retry).await?;
        let listing: NotesResponse = serde_json::from_str(&body)
            .map_err(|e| super::FetchError::Parse(e.to_string()))?;

        let mut submissions: Vec<Submission> = listing
            .notes
            .into_iter()
            .map(Submission::from_note)
            .collect();
        if let Some(limit) = limit {
            submissions.truncate(limit);
        }

        info!(
            venue_id,
            count = submissions.len(),
            "fetched venue listing from OpenReview"
        );
        Ok(submissions)
    }
}

impl Submission {
    fn from_note(note: Note) -> Self {
        let title = match note.content.title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => {
                warn!("submission missing title, substituting placeholder");
                UNKNOWN.to_string()
            }
        };
        let abstract_text = match note.content.abstract_text {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => NO_ABSTRACT.to_string(),
        };
        let authors = note.content.authors.unwrap_or_default();
        let identifier = match note.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => slugify(&title),
        };
        let url = format!("https://openreview.net/forum?id={identifier}");

        Self {
            identifier,
            title,
            abstract_text,
            authors,
            url,
        }
    }
}

/// Derives a stable slug identifier from a title.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[derive(Debug, Deserialize)]
struct NotesResponse {
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Debug, Deserialize)]
struct Note {
    id: Option<String>,
    #[serde(default)]
    content: NoteContent,
}

#[derive(Debug, Default, Deserialize)]
struct NoteContent {
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    authors: Option<Vec<String>>,
}
