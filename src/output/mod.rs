//! Output module for posts files, extraction tables, and summaries
//!
//! This module handles:
//! - Writing and reading the posts TSV file
//! - Writing the merged extraction table
//! - Computing and printing post statistics
//! - Rendering the markdown summary
//! - Delivering the summary to webhook notifiers

mod markdown;
pub mod notify;
pub mod stats;
mod tsv;

pub use markdown::{format_summary, write_summary, SummaryContext};
pub use notify::{Channel, NotificationSender, NotifyReport, Webhooks};
pub use stats::{print_statistics, PostStatistics};
pub use tsv::{read_posts, sort_newest_first, write_posts, write_table, POSTS_HEADER};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Malformed input: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
