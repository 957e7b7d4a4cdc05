//! Crawler coordinator - board scan orchestration
//!
//! Boards are scanned one after another, pages in increasing order, with one
//! request in flight at a time. Each board's `BoardProgress` decides when the
//! scan stops:
//!
//! - page 1 empty or unreachable: `StoppedEmpty`
//! - a page holding only posts older than the cutoff: `StoppedStale`
//! - page limit reached, or a later page came back empty: `Exhausted`
//!
//! No page or board failure aborts the crawl.

use crate::config::{Config, SiteConfig};
use crate::crawler::fetcher::PageSource;
use crate::crawler::parser::parse_board_page;
use crate::crawler::politeness::Politeness;
use crate::model::{BoardId, Post};
use crate::state::{BoardProgress, BoardState, PageSummary};
use chrono::{Duration, Local, NaiveDateTime};
use std::sync::Arc;

/// How one board's scan ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardOutcome {
    pub board_id: BoardId,
    pub state: BoardState,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub posts_accepted: usize,
}

impl From<&BoardProgress> for BoardOutcome {
    fn from(progress: &BoardProgress) -> Self {
        Self {
            board_id: progress.board_id.clone(),
            state: progress.state,
            pages_fetched: progress.pages_fetched,
            pages_failed: progress.pages_failed,
            posts_accepted: progress.posts_accepted,
        }
    }
}

/// Result of a full crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Accepted posts across all boards, in discovery order
    pub posts: Vec<Post>,

    /// One outcome per configured board, in configuration order
    pub boards: Vec<BoardOutcome>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    site: SiteConfig,
    source: Arc<dyn PageSource>,
    politeness: Politeness,
    cutoff: NaiveDateTime,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// The cutoff is `days-limit` days before the current local time, or the
    /// earliest representable time when that lies out of range.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `source` - Where board pages come from
    pub fn new(config: &Config, source: Arc<dyn PageSource>) -> Self {
        let cutoff = Local::now()
            .naive_local()
            .checked_sub_signed(Duration::days(i64::from(config.site.days_limit)))
            .unwrap_or(NaiveDateTime::MIN);

        Self {
            site: config.site.clone(),
            source,
            politeness: Politeness::from_config(&config.politeness),
            cutoff,
        }
    }

    /// Replaces the acceptance cutoff
    pub fn with_cutoff(mut self, cutoff: NaiveDateTime) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Replaces the pacing between requests
    pub fn with_politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = politeness;
        self
    }

    /// Runs the crawl over every configured board
    pub async fn run(&self) -> CrawlReport {
        tracing::info!(
            "Crawling {} boards, up to {} pages each, posts since {}",
            self.site.boards.len(),
            self.site.pages_per_board,
            self.cutoff.format("%Y-%m-%d %H:%M")
        );

        let start_time = std::time::Instant::now();
        let mut report = CrawlReport::default();

        for (position, board) in self.site.boards.iter().enumerate() {
            tracing::info!(
                "Board {} ({}/{})",
                board,
                position + 1,
                self.site.boards.len()
            );

            let (outcome, posts) = self.crawl_board(board).await;

            tracing::info!(
                "Board {} finished as {}: {} posts from {} pages ({} failed)",
                board,
                outcome.state,
                outcome.posts_accepted,
                outcome.pages_fetched,
                outcome.pages_failed
            );

            report.posts.extend(posts);
            report.boards.push(outcome);

            self.politeness.after_board().await;
        }

        tracing::info!(
            "Crawl completed: {} posts from {} boards in {:?}",
            report.posts.len(),
            report.boards.len(),
            start_time.elapsed()
        );

        report
    }

    /// Scans one board until its progress reaches a terminal state
    async fn crawl_board(&self, board: &BoardId) -> (BoardOutcome, Vec<Post>) {
        let mut progress = BoardProgress::new(board.clone(), self.site.pages_per_board, self.cutoff);
        let mut accepted = Vec::new();

        while let Some(page) = progress.pending_page() {
            let fetched = self.source.fetch_page(board, page).await;

            match fetched {
                Ok(html) => {
                    let posts = parse_board_page(&html, board, page);
                    let summary = PageSummary::from_dates(posts.iter().map(|p| p.date), self.cutoff);

                    tracing::debug!(
                        "Board {} page {}: {} posts, {} recent, oldest {:?}",
                        board,
                        page,
                        summary.total,
                        summary.accepted,
                        summary.oldest
                    );

                    accepted.extend(posts.into_iter().filter(|p| progress.accepts(p.date)));

                    match progress.record_page(page, &summary) {
                        BoardState::StoppedEmpty => {
                            tracing::warn!("Board {} page 1 has no posts", board)
                        }
                        BoardState::StoppedStale => tracing::info!(
                            "Board {} page {} holds only posts older than the cutoff",
                            board,
                            page
                        ),
                        _ => {}
                    }
                }
                Err(e) => {
                    tracing::error!("Board {} page {} failed: {}", board, page, e);
                    progress.record_failure(page);
                }
            }

            self.politeness.after_page().await;
        }

        (BoardOutcome::from(&progress), accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::FetchError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages and records every request
    #[derive(Default)]
    struct StubSource {
        pages: HashMap<(String, u32), String>,
        failing: Vec<(String, u32)>,
        requests: Mutex<Vec<(String, u32)>>,
    }

    impl StubSource {
        fn page(mut self, board: &str, page: u32, html: String) -> Self {
            self.pages.insert((board.to_string(), page), html);
            self
        }

        fn failing(mut self, board: &str, page: u32) -> Self {
            self.failing.push((board.to_string(), page));
            self
        }

        fn requested(&self) -> Vec<(String, u32)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn fetch_page(&self, board: &BoardId, page: u32) -> crate::FetchResult<String> {
            let key = (board.as_str().to_string(), page);
            self.requests.lock().unwrap().push(key.clone());

            if self.failing.contains(&key) {
                return Err(FetchError::HttpStatus {
                    url: format!("stub://{}/{}", key.0, key.1),
                    status: 500,
                });
            }
            Ok(self.pages.get(&key).cloned().unwrap_or_default())
        }
    }

    fn listing(posts: &[(&str, &str)]) -> String {
        let containers: Vec<String> = posts
            .iter()
            .enumerate()
            .map(|(i, (title, date))| {
                format!(
                    r#"<div class="list">
                        <div class="listtitle"><a href="dispbbs.asp?ID={}">{}</a></div>
                        <div class="list_r1"><div class="list_t"><a>{}</a></div></div>
                    </div>"#,
                    i + 1,
                    title,
                    date
                )
            })
            .collect();
        format!("<html><body>{}</body></html>", containers.join(""))
    }

    fn config(boards: &str, pages: u32) -> Config {
        parse_config(&format!(
            r#"
[site]
base-url = "http://forum.test/"
boards = [{}]
pages-per-board = {}
"#,
            boards, pages
        ))
        .unwrap()
    }

    fn cutoff() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn coordinator(config: &Config, source: Arc<StubSource>) -> Coordinator {
        Coordinator::new(config, source)
            .with_cutoff(cutoff())
            .with_politeness(Politeness::none())
    }

    #[tokio::test]
    async fn test_stale_page_stops_board() {
        let source = Arc::new(
            StubSource::default()
                .page(
                    "9",
                    1,
                    listing(&[("new", "2025-05-12 10:00:00"), ("old", "2025-05-01 10:00:00")]),
                )
                .page("9", 2, listing(&[("older", "2025-04-30 10:00:00")]))
                .page("9", 3, listing(&[("fresh again", "2025-05-12 10:00:00")])),
        );

        let report = coordinator(&config("9", 5), source.clone()).run().await;

        assert_eq!(source.requested(), vec![("9".to_string(), 1), ("9".to_string(), 2)]);
        assert_eq!(report.posts.len(), 1);
        assert_eq!(report.posts[0].title, "new");
        assert_eq!(report.boards[0].state, BoardState::StoppedStale);
        assert_eq!(report.boards[0].pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_empty_first_page_stops_board() {
        let source = Arc::new(
            StubSource::default()
                .page("1", 1, "<html><body>nothing</body></html>".to_string())
                .page("1", 2, listing(&[("unreached", "2025-05-12 10:00:00")])),
        );

        let report = coordinator(&config("1", 3), source.clone()).run().await;

        assert_eq!(source.requested(), vec![("1".to_string(), 1)]);
        assert!(report.posts.is_empty());
        assert_eq!(report.boards[0].state, BoardState::StoppedEmpty);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let source = Arc::new(
            StubSource::default()
                .failing("1", 1)
                .page("2", 1, listing(&[("a", "2025-05-12 10:00:00")]))
                .failing("2", 2)
                .page("2", 3, listing(&[("b", "2025-05-11 10:00:00")])),
        );

        let report = coordinator(&config(r#""1", "2""#, 3), source.clone()).run().await;

        assert_eq!(
            source.requested(),
            vec![
                ("1".to_string(), 1),
                ("2".to_string(), 1),
                ("2".to_string(), 2),
                ("2".to_string(), 3)
            ]
        );
        assert_eq!(report.boards[0].state, BoardState::StoppedEmpty);
        assert_eq!(report.boards[1].state, BoardState::Exhausted);
        assert_eq!(report.boards[1].pages_failed, 1);

        let titles: Vec<&str> = report.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_page_limit_and_discovery_order() {
        let source = Arc::new(
            StubSource::default()
                .page("3", 1, listing(&[("x1", "2025-05-12 10:00:00"), ("x2", "2025-05-11 09:00:00")]))
                .page("3", 2, listing(&[("x3", "2025-05-10 08:00:00")]))
                .page("3", 3, listing(&[("x4", "2025-05-10 07:00:00")]))
                .page("4", 1, listing(&[("y1", "2025-05-13 10:00:00")])),
        );

        let report = coordinator(&config("3, 4", 2), source.clone()).run().await;

        assert!(!source.requested().contains(&("3".to_string(), 3)));
        let titles: Vec<&str> = report.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["x1", "x2", "x3", "y1"]);
        assert!(report
            .boards
            .iter()
            .all(|b| b.state == BoardState::Exhausted));
        assert_eq!(report.posts[3].board_id, BoardId::new("4"));
    }

    #[tokio::test]
    async fn test_empty_later_page_ends_board() {
        let source = Arc::new(
            StubSource::default().page("5", 1, listing(&[("only", "2025-05-12 10:00:00")])),
        );

        let report = coordinator(&config("5", 4), source.clone()).run().await;

        assert_eq!(source.requested().len(), 2);
        assert_eq!(report.boards[0].state, BoardState::Exhausted);
        assert_eq!(report.boards[0].posts_accepted, 1);
    }

    #[test]
    fn test_default_cutoff_uses_days_limit() {
        let config = config("1", 1);
        let source: Arc<dyn PageSource> = Arc::new(StubSource::default());
        let coordinator = Coordinator::new(&config, source);

        let expected = Local::now().naive_local() - Duration::days(2);
        let delta = (coordinator.cutoff - expected).num_seconds().abs();
        assert!(delta < 5);
    }

    #[test]
    fn test_out_of_range_days_limit_keeps_every_post() {
        let mut config = config("1", 1);
        config.site.days_limit = 400_000_000;
        let source: Arc<dyn PageSource> = Arc::new(StubSource::default());

        let coordinator = Coordinator::new(&config, source);
        assert_eq!(coordinator.cutoff, NaiveDateTime::MIN);
    }
}
