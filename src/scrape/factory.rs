//! Venue-type table and scraper construction.
//!
//! The set of supported venues is a closed table: each venue type maps to
//! exactly one strategy and declares which locator it needs. All locator
//! validation happens here, before any network client is exercised, so a
//! misconfigured invocation fails immediately.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::arxiv::ArxivFetcher;
use crate::fetch::openreview::OpenReviewFetcher;
use crate::fetch::ReqwestTransport;

use super::{ScrapeError, VenueScraper};

/// Supported venue types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueType {
    /// International Conference on Computer Vision (listing page)
    Iccv,
    /// Conference on Computer Vision and Pattern Recognition (listing page)
    Cvpr,
    /// International Conference on Learning Representations (OpenReview API)
    Iclr,
}

impl VenueType {
    /// Display acronym recorded on scraped records.
    pub fn venue_name(&self) -> &'static str {
        match self {
            VenueType::Iccv => "ICCV",
            VenueType::Cvpr => "CVPR",
            VenueType::Iclr => "ICLR",
        }
    }

    /// True when the strategy needs a listing-page URL.
    fn needs_url(&self) -> bool {
        matches!(self, VenueType::Iccv | VenueType::Cvpr)
    }
}

impl FromStr for VenueType {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iccv" => Ok(VenueType::Iccv),
            "cvpr" => Ok(VenueType::Cvpr),
            "iclr" => Ok(VenueType::Iclr),
            other => Err(ScrapeError::UnknownVenueType(other.to_string())),
        }
    }
}

impl fmt::Display for VenueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.venue_name())
    }
}

/// Builds [`VenueScraper`]s from venue-type tokens and locators.
pub struct ScraperFactory;

impl ScraperFactory {
    /// Resolves a venue-type token and locators into a configured scraper.
    ///
    /// Unknown tokens and missing locators are rejected here, before any
    /// network activity.
    pub fn get_scraper(
        venue_type: &str,
        year: &str,
        limit: Option<usize>,
        venue_id: Option<&str>,
        url: Option<&str>,
    ) -> Result<VenueScraper, ScrapeError> {
        let venue_type: VenueType = venue_type.parse()?;
        Self::build(venue_type, year, limit, venue_id, url)
    }

    fn build(
        venue_type: VenueType,
        year: &str,
        limit: Option<usize>,
        venue_id: Option<&str>,
        url: Option<&str>,
    ) -> Result<VenueScraper, ScrapeError> {
        if venue_type.needs_url() {
            let url = url
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| ScrapeError::MissingUrl(venue_type.venue_name().to_string()))?;
            let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
            let fetcher = Arc::new(ArxivFetcher::new()?);
            Ok(VenueScraper::listing_page(
                transport,
                fetcher,
                url,
                venue_type.venue_name(),
                year,
                limit,
            ))
        } else {
            let venue_id = venue_id
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ScrapeError::MissingVenueId(venue_type.venue_name().to_string()))?;
            let fetcher = OpenReviewFetcher::new()?;
            Ok(VenueScraper::api_listing(
                fetcher,
                venue_id,
                venue_type.venue_name(),
                year,
                limit,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_parse_case_insensitively() {
        assert_eq!("iccv".parse::<VenueType>().unwrap(), VenueType::Iccv);
        assert_eq!("CVPR".parse::<VenueType>().unwrap(), VenueType::Cvpr);
        assert_eq!(" Iclr ".parse::<VenueType>().unwrap(), VenueType::Iclr);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let result = ScraperFactory::get_scraper("neurips", "2024", None, None, None);
        assert!(
            matches!(result, Err(ScrapeError::UnknownVenueType(ref token)) if token == "neurips")
        );
    }

    #[test]
    fn test_listing_venue_requires_url() {
        let result = ScraperFactory::get_scraper("iccv", "2023", None, None, None);
        assert!(matches!(result, Err(ScrapeError::MissingUrl(_))));

        let result = ScraperFactory::get_scraper("cvpr", "2024", None, None, Some("  "));
        assert!(matches!(result, Err(ScrapeError::MissingUrl(_))));
    }

    #[test]
    fn test_api_venue_requires_venue_id() {
        let result = ScraperFactory::get_scraper("iclr", "2024", None, None, None);
        assert!(matches!(result, Err(ScrapeError::MissingVenueId(_))));
    }

    #[test]
    fn test_valid_configurations_accepted() {
        assert!(ScraperFactory::get_scraper(
            "iccv",
            "2023",
            Some(10),
            None,
            Some("https://openaccess.thecvf.com/ICCV2023"),
        )
        .is_ok());

        assert!(ScraperFactory::get_scraper(
            "iclr",
            "2024",
            None,
            Some("ICLR.cc/2024/Conference"),
            None,
        )
        .is_ok());
    }
}
