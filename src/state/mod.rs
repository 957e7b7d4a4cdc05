//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `BoardState`: Where a board is in its scan (scanning, stopped, exhausted)
//! - `BoardProgress`: Per-board page counters and the state transitions
//! - `PageSummary`: What a single page contributed

mod board_progress;
mod board_state;

// Re-export main types
pub use board_progress::{BoardProgress, PageSummary};
pub use board_state::BoardState;
