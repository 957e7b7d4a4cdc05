//! Request pacing
//!
//! The crawl is strictly sequential; pacing only inserts random pauses after
//! each page and after each board so the listing never sees bursts.

use crate::config::PolitenessConfig;
use rand::Rng;
use std::time::Duration;

/// Inclusive range of pause lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    /// Creates a range from millisecond bounds
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms.max(min_ms)),
        }
    }

    /// A range that never pauses
    pub fn zero() -> Self {
        Self::from_millis(0, 0)
    }

    /// Picks a pause uniformly from the range
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let millis = rand::thread_rng()
            .gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }

    /// Sleeps for a sampled duration
    pub async fn pause(&self) {
        let wait = self.sample();
        if !wait.is_zero() {
            tracing::trace!("Pausing {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}

/// Pauses applied between pages and between boards
#[derive(Debug, Clone, Copy)]
pub struct Politeness {
    pub page: DelayRange,
    pub board: DelayRange,
}

impl Politeness {
    /// Builds pacing from the `[politeness]` section
    pub fn from_config(config: &PolitenessConfig) -> Self {
        Self {
            page: DelayRange::from_millis(config.page_delay_min_ms, config.page_delay_max_ms),
            board: DelayRange::from_millis(config.board_delay_min_ms, config.board_delay_max_ms),
        }
    }

    /// Pacing without any pauses
    pub fn none() -> Self {
        Self {
            page: DelayRange::zero(),
            board: DelayRange::zero(),
        }
    }

    /// Waits after a page fetch, whatever its outcome
    pub async fn after_page(&self) {
        self.page.pause().await;
    }

    /// Waits after a board is finished
    pub async fn after_board(&self) {
        self.board.pause().await;
    }
}
