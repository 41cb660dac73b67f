//! Venue scraping strategies.
//!
//! A [`VenueScraper`] turns one venue locator (a listing-page URL or an
//! OpenReview venue identifier) into normalized [`PaperRecord`]s. Two
//! structurally different strategies exist, selected by venue topology:
//!
//! - **Listing page**: fetch one HTML page, pair each anchor whose text
//!   contains the arXiv marker with the nearest preceding title element in
//!   document order, then fetch abstract and authors per paper.
//! - **API listing**: one venue-listing call that already returns full
//!   content per submission, mapped directly into records.
//!
//! A failure fetching the top-level listing degrades to an empty result
//! (logged), so one bad venue cannot corrupt downstream repository writes.

pub mod factory;

use std::sync::Arc;

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::fetch::openreview::OpenReviewFetcher;
use crate::fetch::{FetchError, HttpTransport, SourceFetcher};
use crate::models::{PaperRecord, NO_ABSTRACT};

pub use factory::{ScraperFactory, VenueType};

/// Anchor-text marker identifying arXiv links on listing pages.
const ARXIV_MARKER: &str = "arXiv";

/// Errors raised while building a scraper.
///
/// These are configuration errors: they are surfaced before any network
/// call and halt execution, unlike the per-item soft failures inside a
/// running scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Venue-type token matches no known strategy
    #[error("no scraper found for venue type: {0}")]
    UnknownVenueType(String),

    /// Selected strategy needs a listing URL
    #[error("venue type '{0}' requires a listing URL")]
    MissingUrl(String),

    /// Selected strategy needs a venue identifier
    #[error("venue type '{0}' requires a venue identifier")]
    MissingVenueId(String),

    /// Underlying HTTP client could not be constructed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// One candidate discovered on a listing page, before per-paper fetching.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    title: String,
    url: String,
    identifier: String,
}

enum Strategy {
    ListingPage {
        transport: Arc<dyn HttpTransport>,
        fetcher: Arc<dyn SourceFetcher>,
    },
    ApiListing {
        fetcher: OpenReviewFetcher,
    },
}

/// Scraper for one venue, configured with its locator and paper cap.
pub struct VenueScraper {
    strategy: Strategy,
    locator: String,
    venue_name: String,
    venue_year: String,
    limit: Option<usize>,
}

impl VenueScraper {
    /// Builds a listing-page scraper over an HTML page URL.
    pub fn listing_page(
        transport: Arc<dyn HttpTransport>,
        fetcher: Arc<dyn SourceFetcher>,
        url: impl Into<String>,
        venue_name: impl Into<String>,
        venue_year: impl Into<String>,
        limit: Option<usize>,
    ) -> Self {
        Self {
            strategy: Strategy::ListingPage { transport, fetcher },
            locator: url.into(),
            venue_name: venue_name.into(),
            venue_year: venue_year.into(),
            limit,
        }
    }

    /// Builds an API-listing scraper over an OpenReview venue identifier.
    pub fn api_listing(
        fetcher: OpenReviewFetcher,
        venue_id: impl Into<String>,
        venue_name: impl Into<String>,
        venue_year: impl Into<String>,
        limit: Option<usize>,
    ) -> Self {
        Self {
            strategy: Strategy::ApiListing { fetcher },
            locator: venue_id.into(),
            venue_name: venue_name.into(),
            venue_year: venue_year.into(),
            limit,
        }
    }

    /// Scrapes the venue, producing records in discovery order.
    ///
    /// `limit` truncates from the front of that order; `None` means scrape
    /// everything discovered. A failure on the top-level listing fetch
    /// returns an empty vec.
    pub async fn get_publications(&self) -> Vec<PaperRecord> {
        match &self.strategy {
            Strategy::ListingPage { transport, fetcher } => {
                self.scrape_listing_page(transport.as_ref(), fetcher.as_ref())
                    .await
            }
            Strategy::ApiListing { fetcher } => self.scrape_api_listing(fetcher).await,
        }
    }

    async fn scrape_listing_page(
        &self,
        transport: &dyn HttpTransport,
        fetcher: &dyn SourceFetcher,
    ) -> Vec<PaperRecord> {
        let html = match transport.get(&self.locator).await {
            Ok(html) => html,
            Err(err) => {
                warn!(url = %self.locator, error = %err, "listing page fetch failed, no papers found");
                return Vec::new();
            }
        };

        let mut candidates = extract_candidates(&html, ARXIV_MARKER);
        if let Some(limit) = self.limit {
            candidates.truncate(limit);
        }
        info!(
            url = %self.locator,
            count = candidates.len(),
            "discovered candidate papers on listing page"
        );

        let mut papers = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let content = fetcher.fetch(&candidate.identifier).await;
            papers.push(PaperRecord {
                identifier: candidate.identifier,
                title: candidate.title,
                authors: content.authors,
                abstract_text: content
                    .abstract_text
                    .unwrap_or_else(|| NO_ABSTRACT.to_string()),
                url: absolutize(&self.locator, &candidate.url),
                venue_name: self.venue_name.clone(),
                venue_year: self.venue_year.clone(),
            });
        }
        papers
    }

    async fn scrape_api_listing(&self, fetcher: &OpenReviewFetcher) -> Vec<PaperRecord> {
        let submissions = match fetcher
            .fetch_accepted_submissions(&self.locator, self.limit)
            .await
        {
            Ok(submissions) => submissions,
            Err(err) => {
                warn!(venue_id = %self.locator, error = %err, "venue listing fetch failed, no papers found");
                return Vec::new();
            }
        };

        submissions
            .into_iter()
            .map(|s| PaperRecord {
                identifier: s.identifier,
                title: s.title,
                authors: s.authors,
                abstract_text: s.abstract_text,
                url: s.url,
                venue_name: self.venue_name.clone(),
                venue_year: self.venue_year.clone(),
            })
            .collect()
    }
}

/// Walks the page in document order, pairing each marker anchor with the
/// nearest preceding `<dt>` title element.
fn extract_candidates(html: &str, marker: &str) -> Vec<Candidate> {
    // Selector lists match in document order, which gives us the
    // title-precedes-anchor pairing for free.
    let selector = Selector::parse("dt, a[href]").expect("static selector is valid");
    let document = Html::parse_document(html);

    let mut last_title: Option<String> = None;
    let mut candidates = Vec::new();

    for element in document.select(&selector) {
        let name = element.value().name();
        if name == "dt" {
            let title = element.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                last_title = Some(title);
            }
            continue;
        }

        let text = element.text().collect::<String>();
        if !text.contains(marker) {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(title) = last_title.clone() else {
            warn!(href, "marker anchor without preceding title, skipping");
            continue;
        };
        let identifier = final_path_segment(href);
        if identifier.is_empty() {
            warn!(href, "could not derive identifier from link, skipping");
            continue;
        }
        candidates.push(Candidate {
            title,
            url: href.to_string(),
            identifier,
        });
    }

    candidates
}

/// Resolves a possibly-relative href against the listing page URL.
fn absolutize(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Final path segment of a link, used as the per-paper identifier.
fn final_path_segment(href: &str) -> String {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::{AlwaysFailTransport, ScriptedTransport};
    use crate::fetch::{FetchedContent, RetryPolicy};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const LISTING_HTML: &str = r#"<html><body>
      <dl>
        <dt class="ptitle"><a href="/content/paper_one.html">First Paper Title</a></dt>
        <dd>
          <a href="https://arxiv.org/abs/2301.00001">arXiv</a>
          <a href="/papers/one.pdf">pdf</a>
        </dd>
        <dt class="ptitle"><a href="/content/paper_two.html">Second Paper Title</a></dt>
        <dd>
          <a href="/papers/two.pdf">pdf</a>
        </dd>
        <dt class="ptitle"><a href="/content/paper_three.html">Third Paper Title</a></dt>
        <dd>
          <a href="https://arxiv.org/abs/2301.00003/">arXiv</a>
        </dd>
      </dl>
    </body></html>"#;

    /// Fetcher that returns a canned abstract, counting calls.
    struct CannedFetcher {
        calls: AtomicUsize,
    }

    impl CannedFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SourceFetcher for CannedFetcher {
        async fn fetch(&self, identifier: &str) -> FetchedContent {
            self.calls.fetch_add(1, Ordering::SeqCst);
            FetchedContent {
                abstract_text: Some(format!("Abstract for {identifier}")),
                authors: vec!["Author One".to_string()],
            }
        }
    }

    /// Fetcher that always returns the sentinel pair.
    struct UnavailableFetcher;

    #[async_trait]
    impl SourceFetcher for UnavailableFetcher {
        async fn fetch(&self, _identifier: &str) -> FetchedContent {
            FetchedContent::unavailable()
        }
    }

    #[test]
    fn test_extract_candidates_pairs_titles_in_document_order() {
        let candidates = extract_candidates(LISTING_HTML, ARXIV_MARKER);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "First Paper Title");
        assert_eq!(candidates[0].identifier, "2301.00001");
        assert_eq!(candidates[0].url, "https://arxiv.org/abs/2301.00001");
        // Second paper has no arXiv anchor; third pairs with its own title
        assert_eq!(candidates[1].title, "Third Paper Title");
        assert_eq!(candidates[1].identifier, "2301.00003");
    }

    #[test]
    fn test_extract_candidates_ignores_unmarked_anchors() {
        let html = r#"<dt>Title</dt><a href="/somewhere.pdf">pdf</a>"#;
        assert!(extract_candidates(html, ARXIV_MARKER).is_empty());
    }

    #[test]
    fn test_extract_candidates_skips_anchor_before_any_title() {
        let html = r#"<a href="https://arxiv.org/abs/1">arXiv</a><dt>Late Title</dt>"#;
        assert!(extract_candidates(html, ARXIV_MARKER).is_empty());
    }

    #[test]
    fn test_absolutize_resolves_relative_hrefs() {
        assert_eq!(
            absolutize("https://openaccess.thecvf.com/ICCV2023", "/content/paper_one.html"),
            "https://openaccess.thecvf.com/content/paper_one.html"
        );
        assert_eq!(
            absolutize("https://openaccess.thecvf.com/ICCV2023", "https://arxiv.org/abs/2301.00001"),
            "https://arxiv.org/abs/2301.00001"
        );
    }

    #[test]
    fn test_final_path_segment() {
        assert_eq!(final_path_segment("https://arxiv.org/abs/2301.00001"), "2301.00001");
        assert_eq!(final_path_segment("https://arxiv.org/abs/2301.00001/"), "2301.00001");
        assert_eq!(final_path_segment(""), "");
    }

    #[tokio::test]
    async fn test_listing_page_scrape_fills_content() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(LISTING_HTML.to_string())]));
        let fetcher = Arc::new(CannedFetcher::new());
        let scraper = VenueScraper::listing_page(
            transport,
            Arc::clone(&fetcher) as Arc<dyn SourceFetcher>,
            "http://test/listing",
            "ICCV",
            "2023",
            None,
        );

        let papers = scraper.get_publications().await;
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].title, "First Paper Title");
        assert_eq!(papers[0].abstract_text, "Abstract for 2301.00001");
        assert_eq!(papers[0].venue_name, "ICCV");
        assert_eq!(papers[0].venue_year, "2023");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listing_page_limit_truncates_from_front() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(LISTING_HTML.to_string())]));
        let fetcher = Arc::new(CannedFetcher::new());
        let scraper = VenueScraper::listing_page(
            transport,
            Arc::clone(&fetcher) as Arc<dyn SourceFetcher>,
            "http://test/listing",
            "ICCV",
            "2023",
            Some(1),
        );

        let papers = scraper.get_publications().await;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].identifier, "2301.00001");
        // Only the kept candidate is fetched
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listing_page_failure_yields_empty() {
        let transport = Arc::new(AlwaysFailTransport::new());
        let scraper = VenueScraper::listing_page(
            transport,
            Arc::new(CannedFetcher::new()),
            "http://test/listing",
            "ICCV",
            "2023",
            None,
        );
        assert!(scraper.get_publications().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_per_paper_fetch_stores_sentinel_record() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(LISTING_HTML.to_string())]));
        let scraper = VenueScraper::listing_page(
            transport,
            Arc::new(UnavailableFetcher),
            "http://test/listing",
            "ICCV",
            "2023",
            None,
        );

        let papers = scraper.get_publications().await;
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].abstract_text, NO_ABSTRACT);
        assert!(papers[0].authors.is_empty());
        assert!(!papers[0].has_abstract());
    }

    #[tokio::test]
    async fn test_api_listing_maps_submissions() {
        let listing = r#"{
            "notes": [
                {"id": "n1", "content": {"title": "Note One", "abstract": "A.", "authors": ["X"]}},
                {"id": "n2", "content": {"title": "Note Two", "abstract": "B.", "authors": ["Y"]}}
            ]
        }"#;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(listing.to_string())]));
        let fetcher = OpenReviewFetcher::with_transport(
            transport,
            "http://test/notes",
            RetryPolicy::new(1, Duration::ZERO),
        );
        let scraper =
            VenueScraper::api_listing(fetcher, "ICLR.cc/2024/Conference", "ICLR", "2024", None);

        let papers = scraper.get_publications().await;
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].identifier, "n1");
        assert_eq!(papers[0].venue_name, "ICLR");
        assert_eq!(papers[1].url, "https://openreview.net/forum?id=n2");
    }

    #[tokio::test]
    async fn test_api_listing_failure_yields_empty() {
        let transport = Arc::new(AlwaysFailTransport::new());
        let fetcher = OpenReviewFetcher::with_transport(
            transport,
            "http://test/notes",
            RetryPolicy::new(1, Duration::ZERO),
        );
        let scraper =
            VenueScraper::api_listing(fetcher, "ICLR.cc/2024/Conference", "ICLR", "2024", None);
        assert!(scraper.get_publications().await.is_empty());
    }
}
