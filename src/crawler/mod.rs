//! Crawler module for board listing collection
//!
//! This module contains the crawling logic, including:
//! - HTTP fetching with retry logic and encoding detection
//! - Listing page parsing and date recovery
//! - Request pacing
//! - Per-board scan coordination

mod coordinator;
pub mod dates;
mod encoding;
mod fetcher;
mod parser;
mod politeness;

pub use coordinator::{BoardOutcome, Coordinator, CrawlReport};
pub use dates::parse_post_date;
pub use encoding::{decode_body, detect_encoding, encoding_for_label};
pub use fetcher::{backoff_delay, build_http_client, build_page_url, Fetcher, PageSource};
pub use parser::{parse_board_page, parse_page_outcomes, ParseOutcome};
pub use politeness::{DelayRange, Politeness};

use crate::config::Config;
use crate::HarvestError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for collecting posts. It will:
/// 1. Build the HTTP client from the `[fetch]` section
/// 2. Scan every configured board page by page
/// 3. Return the accepted posts and per-board outcomes
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished (possibly with failed pages)
/// * `Err(HarvestError)` - The HTTP client could not be built
pub async fn crawl(config: &Config) -> Result<CrawlReport, HarvestError> {
    let fetcher = Fetcher::new(config.site.clone(), config.fetch.clone())?;
    let coordinator = Coordinator::new(config, Arc::new(fetcher));
    Ok(coordinator.run().await)
}
