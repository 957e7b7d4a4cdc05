use crate::model::{BoardId, BoardNames};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Main configuration structure for Board-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Board id to human-readable category name
    #[serde(rename = "board-names", default)]
    pub board_names: HashMap<String, String>,
}

impl Config {
    /// Builds the read-only board name lookup
    pub fn board_names(&self) -> BoardNames {
        BoardNames::new(self.board_names.clone())
    }
}

/// Which site and boards to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root address of the forum (e.g., "http://www.pm001.net/")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Board page path relative to `base-url`, with `{board}` and `{page}` placeholders
    #[serde(rename = "page-path", default = "default_page_path")]
    pub page_path: String,

    /// Boards to crawl, in order
    pub boards: Vec<BoardId>,

    /// Only posts from the last N days are kept
    #[serde(rename = "days-limit", default = "default_days_limit")]
    pub days_limit: u32,

    /// Maximum number of pages scanned per board
    #[serde(rename = "pages-per-board", default = "default_pages_per_board")]
    pub pages_per_board: u32,
}

/// HTTP fetch behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Total attempts per page, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Nominal wait before the second attempt; doubles for each later one (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// HTTP statuses that trigger a retry
    #[serde(rename = "retry-status-codes", default = "default_retry_status_codes")]
    pub retry_status_codes: Vec<u16>,

    /// Per-attempt request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// Encoding label used when the page declares none and is not valid UTF-8
    #[serde(rename = "fallback-encoding", default = "default_fallback_encoding")]
    pub fallback_encoding: String,

    /// User-agent strings rotated across attempts
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            retry_status_codes: default_retry_status_codes(),
            timeout_secs: default_fetch_timeout_secs(),
            fallback_encoding: default_fallback_encoding(),
            user_agents: default_user_agents(),
        }
    }
}

/// Pauses between requests (milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    #[serde(rename = "page-delay-min-ms", default = "default_page_delay_min_ms")]
    pub page_delay_min_ms: u64,

    #[serde(rename = "page-delay-max-ms", default = "default_page_delay_max_ms")]
    pub page_delay_max_ms: u64,

    #[serde(rename = "board-delay-min-ms", default = "default_board_delay_min_ms")]
    pub board_delay_min_ms: u64,

    #[serde(rename = "board-delay-max-ms", default = "default_board_delay_max_ms")]
    pub board_delay_max_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            page_delay_min_ms: default_page_delay_min_ms(),
            page_delay_max_ms: default_page_delay_max_ms(),
            board_delay_min_ms: default_board_delay_min_ms(),
            board_delay_max_ms: default_board_delay_max_ms(),
        }
    }
}

/// Extraction service and worker pool settings
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI-compatible API root
    #[serde(rename = "base-url", default = "default_analysis_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Maximum posts per extraction request
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent extraction requests
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Total attempts per batch
    #[serde(rename = "max-retries", default = "default_analysis_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts of the same batch (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_analysis_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_analysis_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            workers: default_workers(),
            max_retries: default_analysis_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// TSV of the crawled posts
    #[serde(rename = "posts-path", default = "default_posts_path")]
    pub posts_path: String,

    /// TSV of the merged extraction table
    #[serde(rename = "table-path", default = "default_table_path")]
    pub table_path: String,

    /// Markdown summary sent to the notifier
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            posts_path: default_posts_path(),
            table_path: default_table_path(),
            summary_path: default_summary_path(),
        }
    }
}

/// Environment variables consulted by the webhook notifier
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(rename = "dingtalk-webhook-env", default = "default_dingtalk_env")]
    pub dingtalk_webhook_env: String,

    #[serde(rename = "feishu-webhook-env", default = "default_feishu_env")]
    pub feishu_webhook_env: String,

    #[serde(rename = "wechat-work-webhook-env", default = "default_wechat_env")]
    pub wechat_work_webhook_env: String,

    /// `owner/name` of the repository the output files are published to
    #[serde(rename = "repository-env", default = "default_repository_env")]
    pub repository_env: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            dingtalk_webhook_env: default_dingtalk_env(),
            feishu_webhook_env: default_feishu_env(),
            wechat_work_webhook_env: default_wechat_env(),
            repository_env: default_repository_env(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_page_path() -> String {
    "index.asp?boardid={board}&page={page}".to_string()
}

fn default_days_limit() -> u32 {
    2
}

fn default_pages_per_board() -> u32 {
    2
}

fn default_max_attempts() -> u32 {
    4
}

fn default_backoff_base_ms() -> u64 {
    2000
}

fn default_retry_status_codes() -> Vec<u16> {
    vec![408, 429, 500, 502, 503, 504]
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_fallback_encoding() -> String {
    "gbk".to_string()
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.2 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:91.0) Gecko/20100101 Firefox/91.0",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.164 Safari/537.36 Edg/91.0.864.71",
        "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Mobile/15E148 Safari/604.1",
    ]
    .iter()
    .map(|ua| ua.to_string())
    .collect()
}

fn default_page_delay_min_ms() -> u64 {
    2000
}

fn default_page_delay_max_ms() -> u64 {
    4000
}

fn default_board_delay_min_ms() -> u64 {
    3000
}

fn default_board_delay_max_ms() -> u64 {
    6000
}

fn default_analysis_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai/".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    40
}

fn default_workers() -> usize {
    4
}

fn default_analysis_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_analysis_timeout_secs() -> u64 {
    120
}

fn default_posts_path() -> String {
    "recent_posts.tsv".to_string()
}

fn default_table_path() -> String {
    "market_table.tsv".to_string()
}

fn default_summary_path() -> String {
    "analysis_result.md".to_string()
}

fn default_dingtalk_env() -> String {
    "DINGTALK_WEBHOOK_URL".to_string()
}

fn default_feishu_env() -> String {
    "FEISHU_WEBHOOK_URL".to_string()
}

fn default_wechat_env() -> String {
    "WECHAT_WORK_WEBHOOK_URL".to_string()
}

fn default_repository_env() -> String {
    "GITHUB_REPOSITORY".to_string()
}
