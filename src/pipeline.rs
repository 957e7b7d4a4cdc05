//! End-to-end run orchestration
//!
//! A run goes through these stages:
//!
//! 1. collect posts (crawl, or read a previously written posts file)
//! 2. write the posts TSV
//! 3. batch extraction and merge into one table
//! 4. write the table TSV and the markdown summary
//! 5. notify
//!
//! Only an unreadable posts input is fatal. Every other stage logs its
//! failure and the run continues with what it has.

use crate::analysis::{partition, AnalysisPool, ChatCompletionExtractor, Extractor, PoolSettings};
use crate::config::{AnalysisConfig, Config};
use crate::crawler::crawl;
use crate::merge::{merge_outputs, MergedTable};
use crate::model::{BoardNames, Post};
use crate::output::{
    format_summary, read_posts, write_posts, write_summary, write_table, NotificationSender,
    PostStatistics, SummaryContext,
};
use crate::{HarvestError, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the extraction stage produced
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub table: MergedTable,
    pub batches_total: usize,
    /// Batches whose every attempt failed
    pub batches_absent: usize,
}

/// Switches for a single run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Read posts from this file instead of crawling
    pub from_posts: Option<PathBuf>,
    pub skip_analysis: bool,
    pub notify: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            from_posts: None,
            skip_analysis: false,
            notify: true,
        }
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// True when posts were collected
    pub success: bool,
    pub message: String,
    pub statistics: PostStatistics,
    pub analysis: Option<AnalysisReport>,
}

/// Partitions, extracts, and merges
///
/// # Arguments
///
/// * `posts` - Accepted posts in discovery order
/// * `config` - The `[analysis]` section (batch size, workers, retries)
/// * `extractor` - Extraction backend
/// * `names` - Board display names
pub async fn analyze_posts(
    posts: &[Post],
    config: &AnalysisConfig,
    extractor: Arc<dyn Extractor>,
    names: Arc<BoardNames>,
) -> AnalysisReport {
    let groups = partition(posts, config.batch_size);
    let batches_total: usize = groups.iter().map(|g| g.batches.len()).sum();

    let pool = AnalysisPool::new(extractor, Arc::clone(&names), PoolSettings::from_config(config));
    let results = pool.run(groups).await;

    let mut outputs = Vec::with_capacity(batches_total);
    let mut batches_absent = 0;
    for board in results {
        for result in board.results {
            match result.output {
                Some(text) => outputs.push(text),
                None => batches_absent += 1,
            }
        }
    }

    let table = merge_outputs(&outputs, &names);

    AnalysisReport {
        table,
        batches_total,
        batches_absent,
    }
}

/// Runs the full pipeline with the configured extraction backend
///
/// A missing API key disables the extraction stage instead of failing.
pub async fn run(config: &Config, options: &RunOptions) -> Result<RunSummary> {
    let extractor: Option<Arc<dyn Extractor>> = if analysis_wanted(config, options) {
        match ChatCompletionExtractor::from_env(&config.analysis) {
            Ok(extractor) => Some(Arc::new(extractor)),
            Err(e) => {
                tracing::warn!("Skipping analysis: {}", e);
                None
            }
        }
    } else {
        None
    };

    run_with_extractor(config, options, extractor).await
}

/// Runs the full pipeline with an explicit extraction backend
pub async fn run_with_extractor(
    config: &Config,
    options: &RunOptions,
    extractor: Option<Arc<dyn Extractor>>,
) -> Result<RunSummary> {
    let names = Arc::new(config.board_names());

    let posts = match &options.from_posts {
        Some(path) => read_posts(path).map_err(|e| HarvestError::InputUnreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?,
        None => {
            let report = crawl(config).await?;
            if let Err(e) = write_posts(&report.posts, Path::new(&config.output.posts_path)) {
                tracing::error!("Failed to write posts file: {}", e);
            }
            report.posts
        }
    };

    let statistics = PostStatistics::from_posts(&posts);

    let analysis = match extractor {
        Some(extractor) if analysis_wanted(config, options) && !posts.is_empty() => {
            let report = analyze_posts(&posts, &config.analysis, extractor, Arc::clone(&names)).await;

            if report.table.is_empty() {
                tracing::warn!("Extraction produced no table");
            } else if let Err(e) = write_table(&report.table, Path::new(&config.output.table_path)) {
                tracing::error!("Failed to write table file: {}", e);
            }
            Some(report)
        }
        _ => None,
    };

    let today = Local::now().date_naive();
    let repository = std::env::var(&config.notify.repository_env).ok();
    let content = format_summary(&SummaryContext {
        stats: &statistics,
        table: analysis.as_ref().map(|a| &a.table),
        names: &names,
        repository: repository.as_deref(),
        data_file: &config.output.posts_path,
        date: today,
    });

    if let Err(e) = write_summary(&content, Path::new(&config.output.summary_path)) {
        tracing::error!("Failed to write summary: {}", e);
    }

    if options.notify {
        let sender = NotificationSender::from_env(&config.notify, config.output.posts_path.clone());
        let title = format!("Board-Harvest update ({})", today.format("%Y-%m-%d"));
        let report = sender.send(&title, &content).await;
        if sender.has_channels() && !report.any_success() {
            tracing::warn!("No notification channel accepted the summary");
        }
    }

    let message = match &analysis {
        Some(report) => format!(
            "{} posts, {} table rows ({} of {} batches failed)",
            posts.len(),
            report.table.len(),
            report.batches_absent,
            report.batches_total
        ),
        None => format!("{} posts, analysis skipped", posts.len()),
    };

    Ok(RunSummary {
        success: !posts.is_empty(),
        message,
        statistics,
        analysis,
    })
}

fn analysis_wanted(config: &Config, options: &RunOptions) -> bool {
    config.analysis.enabled && !options.skip_analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::model::BoardId;
    use crate::AnalysisError;
    use crate::analysis::BatchRequest;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Returns a TSV block per batch; fails the configured batches first
    #[derive(Default)]
    struct TableExtractor {
        failures: HashMap<(String, usize), usize>,
        calls: Mutex<HashMap<(String, usize), usize>>,
    }

    #[async_trait]
    impl Extractor for TableExtractor {
        async fn extract(&self, request: &BatchRequest) -> std::result::Result<String, AnalysisError> {
            let key = (request.board_id.as_str().to_string(), request.batch_index);
            let call = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(key.clone()).or_insert(0);
                *count += 1;
                *count
            };
            if call <= self.failures.get(&key).copied().unwrap_or(0) {
                return Err(AnalysisError::Status {
                    status: 503,
                    body: "overloaded".to_string(),
                });
            }

            let mut text = String::from("```tsv\noriginal_title\tintent\tboard_id\tdate\n");
            for post in &request.posts {
                text.push_str(&format!(
                    "{}\tsell\t{}\t{}\n",
                    post.title,
                    post.board_id,
                    post.date_string()
                ));
            }
            text.push_str("```\n");
            Ok(text)
        }
    }

    fn post(board: &str, title: &str) -> Post {
        Post {
            board_id: BoardId::new(board),
            page: 1,
            post_id: String::new(),
            title: title.to_string(),
            author: "a".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 9)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            replies: 0,
            views: 0,
        }
    }

    fn posts() -> Vec<Post> {
        let mut posts: Vec<Post> = (0..5).map(|i| post("1", &format!("one-{}", i))).collect();
        posts.push(post("2", "two-0"));
        posts.extend((0..3).map(|i| post("3", &format!("three-{}", i))));
        posts
    }

    fn analysis_config() -> AnalysisConfig {
        AnalysisConfig {
            batch_size: 2,
            workers: 3,
            max_retries: 3,
            retry_delay_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_flaky_batch_rows_reach_the_table() {
        let mut failures = HashMap::new();
        failures.insert(("1".to_string(), 1), 2);
        let extractor = Arc::new(TableExtractor {
            failures,
            ..Default::default()
        });
        let names: BoardNames = vec![("1".to_string(), "Silver".to_string())].into_iter().collect();

        let report = analyze_posts(&posts(), &analysis_config(), extractor, Arc::new(names)).await;

        assert_eq!(report.batches_total, 6);
        assert_eq!(report.batches_absent, 0);
        assert_eq!(report.table.len(), 9);
        assert_eq!(
            report.table.header,
            vec!["original_title", "intent", "board_id", "board_name", "date"]
        );

        let titles: Vec<&str> = report.table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "one-0", "one-1", "one-2", "one-3", "one-4", "two-0", "three-0", "three-1", "three-2"
            ]
        );
        assert_eq!(report.table.rows[2][3], "Silver");
        assert_eq!(report.table.rows[5][3], "2");
    }

    #[tokio::test]
    async fn test_exhausted_batch_is_counted_absent() {
        let mut failures = HashMap::new();
        failures.insert(("2".to_string(), 0), 5);
        let extractor = Arc::new(TableExtractor {
            failures,
            ..Default::default()
        });

        let report = analyze_posts(
            &posts(),
            &analysis_config(),
            extractor,
            Arc::new(BoardNames::default()),
        )
        .await;

        assert_eq!(report.batches_absent, 1);
        assert_eq!(report.table.len(), 8);
        assert!(report.table.rows.iter().all(|r| r[0] != "two-0"));
    }

    fn file_config(dir: &TempDir) -> Config {
        let path = |name: &str| dir.path().join(name).display().to_string();
        parse_config(&format!(
            r#"
[site]
base-url = "http://127.0.0.1:9/"
boards = [1, 2, 3]

[analysis]
batch-size = 2
retry-delay-ms = 0

[output]
posts-path = "{}"
table-path = "{}"
summary-path = "{}"

[notify]
dingtalk-webhook-env = ""
feishu-webhook-env = ""
wechat-work-webhook-env = ""
repository-env = ""

[board-names]
1 = "Silver"
"#,
            path("posts.tsv"),
            path("table.tsv"),
            path("summary.md")
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_from_posts_file() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);
        let input = dir.path().join("input.tsv");
        write_posts(&posts(), &input).unwrap();

        let options = RunOptions {
            from_posts: Some(input),
            notify: false,
            ..Default::default()
        };
        let summary = run_with_extractor(&config, &options, Some(Arc::new(TableExtractor::default())))
            .await
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.statistics.total_posts, 9);
        assert_eq!(summary.analysis.as_ref().map(|a| a.table.len()), Some(9));

        let table = std::fs::read_to_string(dir.path().join("table.tsv")).unwrap();
        assert!(table.starts_with("original_title\tintent\tboard_id\tboard_name\tdate\n"));
        assert!(table.contains("\t1\tSilver\t"));

        let summary_md = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(summary_md.contains("- Total posts: 9"));
        assert!(summary_md.contains("**Market table** (9 rows)"));
    }

    #[tokio::test]
    async fn test_run_skip_analysis() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);
        let input = dir.path().join("input.tsv");
        write_posts(&posts(), &input).unwrap();

        let options = RunOptions {
            from_posts: Some(input),
            skip_analysis: true,
            notify: false,
        };
        let summary = run_with_extractor(&config, &options, Some(Arc::new(TableExtractor::default())))
            .await
            .unwrap();

        assert!(summary.analysis.is_none());
        assert!(!dir.path().join("table.tsv").exists());
        assert_eq!(summary.message, "9 posts, analysis skipped");
    }

    #[tokio::test]
    async fn test_unreadable_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir);
        let options = RunOptions {
            from_posts: Some(dir.path().join("missing.tsv")),
            notify: false,
            ..Default::default()
        };

        let result = run_with_extractor(&config, &options, None).await;
        assert!(matches!(result, Err(HarvestError::InputUnreadable { .. })));
    }
}
