//! arXiv metadata fetcher.
//!
//! Resolves a single arXiv identifier to its abstract and author list via
//! the arXiv Atom API (`export.arxiv.org/api/query?id_list=...`). The Atom
//! payload is parsed with `quick-xml` because Atom namespaces make regex
//! parsing brittle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, warn};

use super::{
    get_with_retry, FetchError, FetchResult, FetchedContent, HttpTransport, ReqwestTransport,
    RetryPolicy, SourceFetcher,
};
use crate::ARXIV_API_URL;

/// Fetcher for per-paper metadata from arXiv.
///
/// Failures (transport errors after retries, or a response missing the
/// expected fields) degrade to [`FetchedContent::unavailable`] rather than
/// an error, so a single paper's failure never aborts a scrape.
pub struct ArxivFetcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    retry: RetryPolicy,
}

impl ArxivFetcher {
    /// Creates a fetcher against the public arXiv API with default retries.
    pub fn new() -> FetchResult<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(30))?;
        Ok(Self::with_transport(
            Arc::new(transport),
            ARXIV_API_URL,
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
}

#[async_trait]
impl SourceFetcher for ArxivFetcher {
    async fn fetch(&self, identifier: &str) -> FetchedContent {
        if identifier.trim().is_empty() {
            warn!("empty arXiv identifier, skipping fetch");
            return FetchedContent::unavailable();
        }

        debug!(identifier, "fetching publication from arxiv.org");
        let url = format!("{}?id_list={}", self.base_url, identifier);
        let body = match get_with_retry(self.transport.as_ref(), &url, self.retry).await {
            Ok(body) => body,
            Err(err) => {
                warn!(identifier, error = %err, "arXiv fetch failed after retries");
                return FetchedContent::unavailable();
            }
        };

        match parse_atom_entry(&body) {
            Ok(content) => {
                info!(identifier, "fetched publication from arxiv.org");
                content
            }
            Err(err) => {
                warn!(identifier, error = %err, "arXiv response missing expected fields");
                FetchedContent::unavailable()
            }
        }
    }
}

/// Extracts the summary and author names from the first `<entry>` of an
/// arXiv Atom feed.
fn parse_atom_entry(body: &str) -> FetchResult<FetchedContent> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut in_entry = false;
    let mut in_author = false;
    let mut tag = String::new();
    let mut summary = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut saw_summary = false;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name.ends_with("entry") {
                    if in_entry {
                        // Only the first entry matters for an id_list query
                        break;
                    }
                    in_entry = true;
                }
                if in_entry && name.ends_with("author") {
                    in_author = true;
                }
                tag = name;
            }
            Ok(Event::Text(t)) => {
                if !in_entry {
                    continue;
                }
                let text = t
                    .unescape()
                    .map_err(|e| FetchError::Parse(e.to_string()))?
                    .to_string();
                if in_author && tag.ends_with("name") {
                    let name = text.trim().to_string();
                    if !name.is_empty() {
                        authors.push(name);
                    }
                } else if tag.ends_with("summary") {
                    // Atom summaries carry the feed's hard line wraps
                    for word in text.split_whitespace() {
                        if !summary.is_empty() {
                            summary.push(' ');
                        }
                        summary.push_str(word);
                    }
                    saw_summary = true;
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name.ends_with("author") {
                    in_author = false;
                } else if name.ends_with("entry") {
                    break;
                }
                tag.clear();
            }
            Ok(_) => {}
            Err(e) => return Err(FetchError::Parse(e.to_string())),
        }
    }

    if !in_entry {
        return Err(FetchError::Parse("feed contains no entry".to_string()));
    }
    if !saw_summary {
        return Err(FetchError::Parse("entry has no summary".to_string()));
    }

    Ok(FetchedContent {
        abstract_text: Some(summary),
        authors,
    })
}
