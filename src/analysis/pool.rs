//! Concurrent extraction worker pool
//!
//! Every batch becomes one task on a `JoinSet`; a shared `Semaphore` bounds how
//! many tasks talk to the extractor at once, across all boards. Each task owns
//! its batch end to end, including retries. Results come back tagged with
//! `(board position, batch index)` and are put back into submission order, so
//! completion order never shows in the output.

use crate::analysis::extractor::{BatchRequest, Extractor};
use crate::analysis::partition::BoardBatches;
use crate::config::AnalysisConfig;
use crate::merge::FAILURE_MARKERS;
use crate::model::{BoardId, BoardNames};
use crate::AnalysisError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of one batch; `None` when every attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub index: usize,
    pub output: Option<String>,
}

impl BatchResult {
    pub fn is_absent(&self) -> bool {
        self.output.is_none()
    }
}

/// All batch outcomes of one board, in batch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardResults {
    pub board_id: BoardId,
    pub results: Vec<BatchResult>,
}

/// Worker count and retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum concurrent extraction calls
    pub workers: usize,
    /// Total attempts per batch
    pub max_attempts: u32,
    /// Pause between attempts of the same batch
    pub retry_delay: Duration,
}

impl PoolSettings {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            max_attempts: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Runs extraction over partitioned batches
pub struct AnalysisPool {
    extractor: Arc<dyn Extractor>,
    names: Arc<BoardNames>,
    settings: PoolSettings,
}

impl AnalysisPool {
    /// Creates a pool
    ///
    /// # Arguments
    ///
    /// * `extractor` - Backend shared by every task
    /// * `names` - Board display names passed along with each batch
    /// * `settings` - Worker count and retry policy
    pub fn new(extractor: Arc<dyn Extractor>, names: Arc<BoardNames>, settings: PoolSettings) -> Self {
        Self {
            extractor,
            names,
            settings,
        }
    }

    /// Extracts every batch and returns the results in submission order
    ///
    /// A batch that keeps failing, or whose task panics, is reported with
    /// `output: None`; its siblings are unaffected.
    pub async fn run(&self, groups: Vec<BoardBatches>) -> Vec<BoardResults> {
        let semaphore = Arc::new(Semaphore::new(self.settings.workers));
        let mut join_set = JoinSet::new();

        // Every slot starts absent and is filled as tasks report back
        let mut collected: Vec<BoardResults> = groups
            .iter()
            .map(|group| BoardResults {
                board_id: group.board_id.clone(),
                results: group
                    .batches
                    .iter()
                    .map(|batch| BatchResult {
                        index: batch.index,
                        output: None,
                    })
                    .collect(),
            })
            .collect();

        let total: usize = groups.iter().map(|g| g.batches.len()).sum();
        tracing::info!(
            "Submitting {} batches from {} boards to {} workers",
            total,
            groups.len(),
            self.settings.workers
        );

        for (position, group) in groups.into_iter().enumerate() {
            let board_name = self.names.lookup(group.board_id.as_str()).to_string();

            for (slot, batch) in group.batches.into_iter().enumerate() {
                let request = BatchRequest {
                    board_id: batch.board_id,
                    board_name: board_name.clone(),
                    batch_index: batch.index,
                    posts: batch.posts,
                };
                let extractor = Arc::clone(&self.extractor);
                let semaphore = Arc::clone(&semaphore);
                let settings = self.settings;

                join_set.spawn(async move {
                    let output = match semaphore.acquire_owned().await {
                        Ok(_permit) => extract_with_retries(extractor.as_ref(), &request, settings).await,
                        Err(e) => {
                            tracing::error!("Worker semaphore closed: {}", e);
                            None
                        }
                    };
                    (position, slot, output)
                });
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((position, slot, output)) => {
                    if let Some(result) = collected
                        .get_mut(position)
                        .and_then(|board| board.results.get_mut(slot))
                    {
                        result.output = output;
                    }
                }
                Err(e) => {
                    tracing::error!("Extraction task failed: {}", e);
                }
            }
        }

        let absent: usize = collected
            .iter()
            .flat_map(|b| b.results.iter())
            .filter(|r| r.is_absent())
            .count();
        tracing::info!(
            "Extraction finished: {} of {} batches succeeded",
            total - absent,
            total
        );

        collected
    }
}

/// Checks that an extraction output is usable
pub fn check_output(text: String) -> Result<String, AnalysisError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Err(AnalysisError::Rejected("empty output".to_string()));
    }
    if let Some(marker) = FAILURE_MARKERS.iter().find(|m| trimmed.starts_with(*m)) {
        return Err(AnalysisError::Rejected(format!(
            "output starts with failure marker '{}'",
            marker
        )));
    }
    Ok(text)
}

async fn extract_with_retries(
    extractor: &dyn Extractor,
    request: &BatchRequest,
    settings: PoolSettings,
) -> Option<String> {
    for attempt in 1..=settings.max_attempts {
        match extractor.extract(request).await.and_then(check_output) {
            Ok(text) => {
                tracing::debug!(
                    "Board {} batch {} extracted on attempt {}",
                    request.board_id,
                    request.batch_index,
                    attempt
                );
                return Some(text);
            }
            Err(e) => {
                tracing::warn!(
                    "Board {} batch {} attempt {}/{} failed: {}",
                    request.board_id,
                    request.batch_index,
                    attempt,
                    settings.max_attempts,
                    e
                );
                if attempt < settings.max_attempts && !settings.retry_delay.is_zero() {
                    tokio::time::sleep(settings.retry_delay).await;
                }
            }
        }
    }

    tracing::warn!(
        "Board {} batch {} gave up after {} attempts",
        request.board_id,
        request.batch_index,
        settings.max_attempts
    );
    None
}
