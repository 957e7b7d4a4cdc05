//! Board-Harvest: an incremental forum listing harvester
//!
//! This crate crawls recently posted listings from a paginated forum, hands
//! them in batches to an external text-extraction service, and merges the
//! returned tables into one deduplicated market dataset.

pub mod analysis;
pub mod config;
pub mod crawler;
pub mod merge;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod state;

use thiserror::Error;

/// Main error type for Board-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Cannot read input {path}: {message}")]
    InputUnreadable { path: String, message: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors from a single page fetch, after retries are exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read response from {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Returns the URL the failed request was sent to
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connection { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::Parse { url, .. } => url,
        }
    }
}

/// Errors from one call to the extraction backend
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Extraction request failed: {0}")]
    Request(String),

    #[error("Extraction service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),

    #[error("Extraction output rejected: {0}")]
    Rejected(String),

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),
}

/// Result type alias for Board-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{BoardId, BoardNames, ExtractionRow, Post};
pub use state::BoardState;
