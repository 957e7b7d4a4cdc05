//! Crawl cycle tests
//!
//! Board pages are served by wiremock at `/index.asp?boardid=N&page=P`.

use super::{board_page, hours_ago, listing, mock_config};
use board_harvest::crawler::{crawl, Coordinator, Fetcher};
use board_harvest::BoardState;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_mock(board: &str, page: u32) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path("/index.asp"))
        .and(query_param("boardid", board))
        .and(query_param("page", page.to_string()))
}

#[tokio::test]
async fn test_full_crawl_stops_per_board() {
    let server = MockServer::start().await;

    page_mock("9", 1)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[
            listing(101, "Selling 1060 dragon", &hours_ago(1)),
            listing(102, "Buying panda coins", &hours_ago(3)),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    page_mock("9", 2)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[
            listing(103, "Old listing", &hours_ago(24 * 10)),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    page_mock("9", 3)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    page_mock("11", 1)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    page_mock("12", 1)
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server.uri(), "9, 11, 12", "");
    let report = crawl(&config).await.unwrap();

    let titles: Vec<&str> = report.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Selling 1060 dragon", "Buying panda coins"]);
    assert_eq!(report.posts[0].post_id, "101");
    assert_eq!(report.posts[0].author, "seller101");
    assert_eq!(report.posts[0].replies, 101);
    assert_eq!(report.posts[0].views, 1010);

    let states: Vec<BoardState> = report.boards.iter().map(|b| b.state).collect();
    assert_eq!(
        states,
        vec![
            BoardState::StoppedStale,
            BoardState::StoppedEmpty,
            BoardState::StoppedEmpty
        ]
    );
    assert_eq!(report.boards[0].pages_fetched, 2);
    assert_eq!(report.boards[0].posts_accepted, 2);
    assert_eq!(report.boards[2].pages_failed, 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;

    page_mock("9", 1)
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    page_mock("9", 1)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[listing(
            7,
            "Selling silver panda",
            &hours_ago(2),
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = mock_config(&server.uri(), "9", "");
    config.site.pages_per_board = 1;

    let report = crawl(&config).await.unwrap();
    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.boards[0].state, BoardState::Exhausted);
    assert_eq!(report.boards[0].pages_failed, 0);
}

#[tokio::test]
async fn test_gbk_page_is_decoded() {
    let server = MockServer::start().await;

    let html = format!(
        r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=gb2312"></head><body>{}</body></html>"#,
        listing(55, "出售银币", &hours_ago(1))
    );
    let (bytes, _, _) = encoding_rs::GBK.encode(&html);

    page_mock("9", 1)
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(bytes.into_owned()),
        )
        .mount(&server)
        .await;

    page_mock("9", 2)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[])))
        .mount(&server)
        .await;

    let config = mock_config(&server.uri(), "9", "");
    let report = crawl(&config).await.unwrap();

    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.posts[0].title, "出售银币");
    assert_eq!(report.boards[0].state, BoardState::Exhausted);
}

#[tokio::test]
async fn test_fixed_cutoff_filters_posts() {
    let server = MockServer::start().await;

    page_mock("9", 1)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[
            listing(1, "Fresh", "2025-05-09 14:18:05"),
            listing(2, "Older", "2025-05-01 09:00:00"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    page_mock("9", 2)
        .respond_with(ResponseTemplate::new(200).set_body_string(board_page(&[listing(
            3,
            "Ancient",
            "2025-04-20 09:00:00",
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server.uri(), "9", "");
    let fetcher = Fetcher::new(config.site.clone(), config.fetch.clone()).unwrap();
    let cutoff = chrono::NaiveDate::from_ymd_opt(2025, 5, 7)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let report = Coordinator::new(&config, Arc::new(fetcher))
        .with_cutoff(cutoff)
        .run()
        .await;

    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.posts[0].title, "Fresh");
    assert_eq!(report.boards[0].state, BoardState::StoppedStale);
}
