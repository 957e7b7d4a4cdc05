//! Whole-run tests: crawl, extraction through a mock completion endpoint,
//! merge, and the files written at the end

use super::{board_page, hours_ago, listing, mock_config};
use board_harvest::analysis::{ChatCompletionExtractor, Extractor};
use board_harvest::config::Config;
use board_harvest::output::read_posts;
use board_harvest::pipeline::{run_with_extractor, RunOptions};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

async fn mount_board(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/index.asp"))
        .and(query_param("boardid", "9"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[
            listing(101, "Selling 1060 dragon", &hours_ago(1)),
            listing(102, "Buying panda coins", &hours_ago(2)),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/index.asp"))
        .and(query_param("boardid", "9"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[])))
        .mount(server)
        .await;
}

fn run_config(server: &MockServer, dir: &TempDir) -> Config {
    let file = |name: &str| dir.path().join(name).display().to_string();
    mock_config(
        &server.uri(),
        "9",
        &format!(
            r#"
[analysis]
base-url = "{}/v1"
batch-size = 1
workers = 2
max-retries = 2
retry-delay-ms = 0
timeout-secs = 5

[output]
posts-path = "{}"
table-path = "{}"
summary-path = "{}"

[board-names]
9 = "Silver"
"#,
            server.uri(),
            file("posts.tsv"),
            file("table.tsv"),
            file("summary.md")
        ),
    )
}

fn extractor(config: &Config) -> Option<Arc<dyn Extractor>> {
    let extractor = ChatCompletionExtractor::new(&config.analysis, "test-key").unwrap();
    Some(Arc::new(extractor))
}

#[tokio::test]
async fn test_run_end_to_end() {
    let server = MockServer::start().await;
    mount_board(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Selling 1060 dragon"))
        .respond_with(completion(
            "Here is the table:\n```tsv\noriginal_title\tintent\tboard_id\tboard_name\nSelling 1060 dragon\tsell\t9\t\n```",
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Buying panda coins"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Buying panda coins"))
        .respond_with(completion(
            "original_title\tintent\tboard_id\tboard_name\nBuying panda coins\tbuy\t9\t",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = run_config(&server, &dir);
    let options = RunOptions {
        notify: false,
        ..Default::default()
    };

    let summary = run_with_extractor(&config, &options, extractor(&config))
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(summary.statistics.total_posts, 2);

    let analysis = summary.analysis.unwrap();
    assert_eq!(analysis.batches_total, 2);
    assert_eq!(analysis.batches_absent, 0);
    assert_eq!(
        analysis.table.rows,
        vec![
            vec!["Selling 1060 dragon", "sell", "9", "Silver"],
            vec!["Buying panda coins", "acquire", "9", "Silver"],
        ]
    );

    let posts = read_posts(&dir.path().join("posts.tsv")).unwrap();
    assert_eq!(posts.len(), 2);

    let table = std::fs::read_to_string(dir.path().join("table.tsv")).unwrap();
    assert!(table.starts_with("original_title\tintent\tboard_id\tboard_name\n"));
    assert!(table.contains("Buying panda coins\tacquire\t9\tSilver"));

    let markdown = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert!(markdown.contains("Board-Harvest update"));
    assert!(markdown.contains("- Listings: 1 selling, 1 acquiring, 0 other"));
}

#[tokio::test]
async fn test_failing_endpoint_leaves_batches_absent() {
    let server = MockServer::start().await;
    mount_board(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"message": "overloaded"}
        })))
        .expect(4)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = run_config(&server, &dir);
    let options = RunOptions {
        notify: false,
        ..Default::default()
    };

    let summary = run_with_extractor(&config, &options, extractor(&config))
        .await
        .unwrap();

    assert!(summary.success);
    let analysis = summary.analysis.unwrap();
    assert_eq!(analysis.batches_absent, 2);
    assert!(analysis.table.is_empty());
    assert!(!Path::new(&config.output.table_path).exists());
    assert!(Path::new(&config.output.posts_path).exists());
    assert!(summary.message.contains("2 of 2 batches failed"));
}
