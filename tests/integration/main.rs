//! End-to-end tests against mock forum and completion servers

mod crawl_tests;
mod pipeline_tests;

use board_harvest::config::{parse_config, Config};
use chrono::{Duration, Local};

/// One listing container in the forum's markup
pub fn listing(post_id: u32, title: &str, date: &str) -> String {
    format!(
        r#"<div class="list">
            <div class="listtitle"><a href="dispbbs.asp?boardid=9&ID={id}">{title}</a></div>
            <div class="list_a"><a href="user.asp?id={id}">seller{id}</a></div>
            <div class="list_c">{id}</div>
            <div class="list_c">{views}</div>
            <div class="list_r1"><div class="list_t"><a href="dispbbs.asp?page=last">{date}</a></div></div>
        </div>"#,
        id = post_id,
        title = title,
        views = post_id * 10,
        date = date
    )
}

/// A board page holding the given containers
pub fn board_page(containers: &[String]) -> String {
    format!(
        "<html><head><title>board</title></head><body>{}</body></html>",
        containers.join("\n")
    )
}

/// A timestamp `hours` before now, in the listing's format
pub fn hours_ago(hours: i64) -> String {
    (Local::now().naive_local() - Duration::hours(hours))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Configuration pointing at a mock server, with every pause disabled
pub fn mock_config(base_url: &str, boards: &str, extra: &str) -> Config {
    parse_config(&format!(
        r#"
[site]
base-url = "{}/"
boards = [{}]
days-limit = 2
pages-per-board = 5

[fetch]
max-attempts = 3
backoff-base-ms = 1
timeout-secs = 5

[politeness]
page-delay-min-ms = 0
page-delay-max-ms = 0
board-delay-min-ms = 0
board-delay-max-ms = 0

[notify]
dingtalk-webhook-env = ""
feishu-webhook-env = ""
wechat-work-webhook-env = ""
repository-env = ""

{}
"#,
        base_url, boards, extra
    ))
    .expect("test configuration should parse")
}
