//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured timeout
//! - Rotating the user-agent string on every attempt
//! - Retry with exponential backoff and jitter for transient failures
//! - Error classification
//! - Decoding bodies whose encoding is undeclared

use crate::config::{FetchConfig, SiteConfig};
use crate::crawler::encoding::{decode_body, encoding_for_label};
use crate::model::BoardId;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use encoding_rs::Encoding;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Something that can return the raw markup of one board page
///
/// The crawl coordinator only depends on this trait, so board scanning can be
/// exercised without a network.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, board: &BoardId, page: u32) -> FetchResult<String>;
}

/// Outcome of a single attempt
#[derive(Debug)]
enum AttemptError {
    /// Worth another attempt
    Retryable(FetchError),
    /// Give up immediately
    Fatal(FetchError),
}

/// Builds the address of one board page
///
/// # Example
///
/// ```
/// use board_harvest::config::SiteConfig;
/// use board_harvest::crawler::build_page_url;
/// use board_harvest::BoardId;
///
/// let site = SiteConfig {
///     base_url: "http://www.example.com/".to_string(),
///     page_path: "index.asp?boardid={board}&page={page}".to_string(),
///     boards: vec![BoardId::new("9")],
///     days_limit: 2,
///     pages_per_board: 2,
/// };
///
/// let url = build_page_url(&site, &BoardId::new("9"), 3).unwrap();
/// assert_eq!(url.as_str(), "http://www.example.com/index.asp?boardid=9&page=3");
/// ```
pub fn build_page_url(
    site: &SiteConfig,
    board: &BoardId,
    page: u32,
) -> Result<Url, url::ParseError> {
    let path = site
        .page_path
        .replace("{board}", board.as_str())
        .replace("{page}", &page.to_string());
    Url::parse(&site.base_url)?.join(&path)
}

/// Builds an HTTP client with the configured timeout
///
/// The user agent is set per request, not on the client.
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Computes the wait before the attempt following `attempt`
///
/// `base * 2^(attempt-1) * jitter`, where `jitter` is expected in `[0.5, 1.5)`.
pub fn backoff_delay(base_ms: u64, attempt: u32, jitter: f64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let nominal = base_ms.saturating_mul(1u64 << exponent);
    Duration::from_millis((nominal as f64 * jitter) as u64)
}

/// Page fetcher with retry, backoff and encoding recovery
pub struct Fetcher {
    client: Client,
    site: SiteConfig,
    config: FetchConfig,
    user_agents: Vec<String>,
    fallback_encoding: &'static Encoding,
}

impl Fetcher {
    /// Creates a new fetcher
    ///
    /// # Arguments
    ///
    /// * `site` - Site settings, used for page addresses and the referer
    /// * `config` - Retry, timeout and encoding settings
    pub fn new(site: SiteConfig, config: FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        let user_agents = config
            .user_agents
            .iter()
            .map(|ua| ua.trim().to_string())
            .filter(|ua| !ua.is_empty())
            .collect();
        let fallback_encoding = encoding_for_label(&config.fallback_encoding);

        Ok(Self {
            client,
            site,
            config,
            user_agents,
            fallback_encoding,
        })
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Decode body and return |
    /// | Status in `retry-status-codes` | Retry with backoff |
    /// | Any other status | Immediate → HttpStatus |
    /// | Timeout | Retry with backoff |
    /// | Connection error | Retry with backoff |
    /// | Body read error | Retry with backoff |
    ///
    /// After `max-attempts` attempts the last error is returned.
    pub async fn fetch(&self, url: &str) -> FetchResult<String> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        tracing::debug!("Requesting {}", url);

        loop {
            let error = match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::Fatal(e)) => {
                    tracing::warn!("Giving up on {}: {}", url, e);
                    return Err(e);
                }
                Err(AttemptError::Retryable(e)) => e,
            };

            if attempt >= max_attempts {
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    url,
                    max_attempts,
                    error
                );
                return Err(error);
            }

            let wait = backoff_delay(self.config.backoff_base_ms, attempt, random_jitter());
            tracing::info!(
                "{}; retrying in {:.2}s ({}/{})",
                error,
                wait.as_secs_f64(),
                attempt,
                max_attempts - 1
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    /// Sends one request with a freshly chosen user agent
    async fn fetch_once(&self, url: &str) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.pick_user_agent())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8")
            .header(REFERER, self.site.base_url.as_str())
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(classify_error(url, &e)))?;

        let status = response.status();
        tracing::debug!("Received HTTP {} from {}", status.as_u16(), url);

        if !status.is_success() {
            let error = FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            };
            return if self.config.retry_status_codes.contains(&status.as_u16()) {
                Err(AttemptError::Retryable(error))
            } else {
                Err(AttemptError::Fatal(error))
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| {
            AttemptError::Retryable(if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Parse {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            })
        })?;

        Ok(decode_body(
            &bytes,
            content_type.as_deref(),
            self.fallback_encoding,
        ))
    }

    fn pick_user_agent(&self) -> String {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| concat!("board-harvest/", env!("CARGO_PKG_VERSION")).to_string())
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch_page(&self, board: &BoardId, page: u32) -> FetchResult<String> {
        let url = build_page_url(&self.site, board, page).map_err(|e| FetchError::Parse {
            url: format!("{}{}", self.site.base_url, self.site.page_path),
            message: e.to_string(),
        })?;
        self.fetch(url.as_str()).await
    }
}

/// Multiplicative jitter in `[0.5, 1.5)`
fn random_jitter() -> f64 {
    rand::thread_rng().gen_range(0.5..1.5)
}

/// Maps a transport error onto the fetch error taxonomy
fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
