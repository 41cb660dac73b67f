//! Scrape binary entry point.
//!
//! This binary scrapes one venue's accepted-paper listing and appends the
//! normalized records to the paper repository file. Records whose identifier
//! is already present are skipped.
//!
//! # Examples
//!
//! Scrape a CVF listing page:
//! ```bash
//! scrape --venue iccv --year 2023 --url https://openaccess.thecvf.com/ICCV2023
//! ```
//!
//! Scrape an OpenReview venue:
//! ```bash
//! scrape --venue iclr --year 2024 --venue-id ICLR.cc/2024/Conference --limit 200
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use paper_harvester::{
    repository::{JsonFileRepository, PaperRepository},
    scrape::ScraperFactory,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Supported venue types
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Venue {
    /// CVF listing page (requires --url)
    Iccv,
    /// CVF listing page (requires --url)
    Cvpr,
    /// OpenReview venue (requires --venue-id)
    Iclr,
}

impl Venue {
    fn token(self) -> &'static str {
        match self {
            Venue::Iccv => "iccv",
            Venue::Cvpr => "cvpr",
            Venue::Iclr => "iclr",
        }
    }
}

/// Scrape CLI for harvesting one venue's accepted papers
#[derive(Parser, Debug)]
#[command(
    name = "scrape",
    version,
    about = "Scrape a venue's accepted papers into the repository file",
    long_about = "Scrapes one venue's accepted-paper listing, fetches abstracts and authors \
                  per paper where needed, and appends normalized records to the repository file.

EXAMPLES:
  Scrape a CVF listing page:
    scrape --venue iccv --year 2023 --url https://openaccess.thecvf.com/ICCV2023

  Scrape an OpenReview venue, capped at 200 papers:
    scrape --venue iclr --year 2024 --venue-id ICLR.cc/2024/Conference --limit 200

  Custom repository file and verbose logging:
    scrape --venue cvpr --year 2024 --url https://... --repository cvpr.json --log-level debug"
)]
struct Args {
    /// Venue type
    #[arg(long, value_enum, value_name = "VENUE")]
    venue: Venue,

    /// Conference year recorded on scraped papers
    #[arg(long, value_name = "YEAR")]
    year: String,

    /// Listing page URL (required for listing-page venues)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// OpenReview venue identifier (required for API venues)
    #[arg(long, value_name = "ID")]
    venue_id: Option<String>,

    /// Cap on scraped papers; omit to scrape everything discovered
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Repository file the records are appended to
    #[arg(long, value_name = "FILE", default_value = "papers_repo.json")]
    repository: PathBuf,

    /// Logging verbosity level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging subsystem with the specified level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Starting venue scrape");
    debug!("CLI arguments: {:?}", args);

    // Locator validation happens here, before any network activity
    let scraper = ScraperFactory::get_scraper(
        args.venue.token(),
        &args.year,
        args.limit,
        args.venue_id.as_deref(),
        args.url.as_deref(),
    )
    .context("Invalid scrape configuration")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed_precise}]")
            .expect("Invalid progress bar template"),
    );
    spinner.set_message(format!("Scraping {} {}", args.venue.token(), args.year));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let start_time = Instant::now();
    let papers = scraper.get_publications().await;
    spinner.finish_and_clear();

    if papers.is_empty() {
        warn!("No papers found for this venue");
        println!("No papers found.");
        return Ok(());
    }

    let without_abstract = papers.iter().filter(|p| !p.has_abstract()).count();
    let repo = JsonFileRepository::new(&args.repository);
    let added = repo
        .append(&papers)
        .with_context(|| format!("Failed to write repository {}", args.repository.display()))?;

    println!(
        "Scraped {} papers in {:.1}s: {} new, {} already present, {} without abstract",
        papers.len(),
        start_time.elapsed().as_secs_f64(),
        added,
        papers.len() - added,
        without_abstract
    );
    println!("Repository: {}", args.repository.display());

    Ok(())
}
