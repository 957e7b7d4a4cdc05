//! Board page parser
//!
//! Turns the markup of one board listing page into post records. The page
//! layout is a sequence of `div.list` containers:
//!
//! ```text
//! div.list
//! ├── div.listtitle > a[href*=dispbbs.asp?...ID=123]   title + post id
//! ├── div.list_a > a                                    author
//! ├── div.list_c, div.list_c                            replies, views
//! └── div.list_r1 > div.list_t > a                      last post date
//! ```
//!
//! Every sub-element is optional except the title and the date; a container
//! missing either is skipped without affecting its siblings.

use crate::crawler::dates::parse_listing_date;
use crate::model::{BoardId, Post, PostDraft, SkipReason};
use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static POST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[?&]ID=(\d+)").expect("valid id regex"));

/// Result of parsing one post container
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Post),
    Skipped {
        /// 0-based position of the container on the page
        index: usize,
        reason: SkipReason,
    },
}

/// CSS selectors for the listing layout
struct ListingSelectors {
    container: Selector,
    title_link: Selector,
    author: Selector,
    counter: Selector,
    date_link: Selector,
}

impl ListingSelectors {
    fn new() -> Result<Self, String> {
        let parse = |css: &str| Selector::parse(css).map_err(|e| format!("{}: {:?}", css, e));
        Ok(Self {
            container: parse("div.list")?,
            title_link: parse("div.listtitle a[href]")?,
            author: parse("div.list_a a")?,
            counter: parse("div.list_c")?,
            date_link: parse("div.list_r1 div.list_t a")?,
        })
    }
}

/// Parses a board page into posts
///
/// Skipped containers are logged; an unrecognisable page yields an empty list.
///
/// # Arguments
///
/// * `html` - The page markup
/// * `board_id` - Board the page belongs to
/// * `page` - 1-based page number
pub fn parse_board_page(html: &str, board_id: &BoardId, page: u32) -> Vec<Post> {
    let outcomes = parse_page_outcomes(html, board_id, page, Local::now().year());
    let mut posts = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        match outcome {
            ParseOutcome::Parsed(post) => {
                tracing::trace!(
                    "Post board={} id={} title='{}' author='{}' replies={} views={} date={}",
                    post.board_id,
                    post.post_id,
                    post.title,
                    post.author,
                    post.replies,
                    post.views,
                    post.date
                );
                posts.push(post);
            }
            ParseOutcome::Skipped {
                index,
                reason: reason @ SkipReason::UnparsableDate(_),
            } => {
                tracing::warn!(
                    "Board {} page {}: skipped container {}: {}",
                    board_id,
                    page,
                    index + 1,
                    reason
                );
            }
            ParseOutcome::Skipped { index, reason } => {
                tracing::debug!(
                    "Board {} page {}: skipped container {}: {}",
                    board_id,
                    page,
                    index + 1,
                    reason
                );
            }
        }
    }

    posts
}

/// Parses a board page into one outcome per post container
///
/// # Arguments
///
/// * `html` - The page markup
/// * `board_id` - Board the page belongs to
/// * `page` - 1-based page number
/// * `reference_year` - Year assumed for dates printed without one
pub fn parse_page_outcomes(
    html: &str,
    board_id: &BoardId,
    page: u32,
    reference_year: i32,
) -> Vec<ParseOutcome> {
    let selectors = match ListingSelectors::new() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Invalid listing selector {}", e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);

    let outcomes: Vec<ParseOutcome> = document
        .select(&selectors.container)
        .enumerate()
        .map(|(index, container)| {
            match parse_container(container, &selectors, reference_year).finish(board_id, page) {
                Ok(post) => ParseOutcome::Parsed(post),
                Err(reason) => ParseOutcome::Skipped { index, reason },
            }
        })
        .collect();

    if outcomes.is_empty() {
        tracing::warn!(
            "Board {} page {}: no post containers found",
            board_id,
            page
        );
    }

    outcomes
}

/// Extracts whatever fields a single container provides
fn parse_container(
    container: ElementRef<'_>,
    selectors: &ListingSelectors,
    reference_year: i32,
) -> PostDraft {
    let mut draft = PostDraft::default();

    let title_link = container.select(&selectors.title_link).find(|a| {
        a.value()
            .attr("href")
            .map(is_thread_link)
            .unwrap_or(false)
    });

    if let Some(link) = title_link {
        draft.title = element_text(link);
        draft.post_id = link
            .value()
            .attr("href")
            .and_then(|href| POST_ID.captures(href))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
    }

    if let Some(author) = container.select(&selectors.author).next() {
        draft.author = element_text(author);
    }

    let counters: Vec<String> = container
        .select(&selectors.counter)
        .take(2)
        .map(element_text)
        .collect();
    if counters.len() == 2 {
        draft.replies = counters[0].parse().unwrap_or(0);
        draft.views = counters[1].parse().unwrap_or(0);
    }

    if let Some(date_link) = container.select(&selectors.date_link).next() {
        let text = element_text(date_link);
        if !text.is_empty() {
            draft.date = parse_listing_date(&text, reference_year);
            draft.date_text = Some(text);
        }
    }

    draft
}

/// Thread links point at `dispbbs.asp` and carry an `ID=` parameter
fn is_thread_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.contains("dispbbs.asp") && lower.contains("id=")
}

/// Concatenated, trimmed text of an element
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .collect::<String>()
        .trim()
        .to_string()
}
