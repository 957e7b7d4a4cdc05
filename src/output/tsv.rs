//! Tab-separated posts and table files

use crate::merge::MergedTable;
use crate::model::{BoardId, Post, DATE_FORMAT};
use crate::output::{OutputError, OutputResult};
use chrono::NaiveDateTime;
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use std::path::Path;

/// Column order of the posts file
pub const POSTS_HEADER: [&str; 8] = [
    "board_id", "page", "post_id", "title", "author", "date", "replies", "views",
];

/// Sorts posts newest first; ties keep their discovery order
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Writes posts to a TSV file, newest first
///
/// # Arguments
///
/// * `posts` - Posts in any order
/// * `path` - Destination file, overwritten
pub fn write_posts(posts: &[Post], path: &Path) -> OutputResult<()> {
    let mut sorted = posts.to_vec();
    sort_newest_first(&mut sorted);

    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record(POSTS_HEADER)?;

    for post in &sorted {
        let page = post.page.to_string();
        let date = post.date_string();
        let replies = post.replies.to_string();
        let views = post.views.to_string();
        writer.write_record([
            post.board_id.as_str(),
            page.as_str(),
            post.post_id.as_str(),
            post.title.as_str(),
            post.author.as_str(),
            date.as_str(),
            replies.as_str(),
            views.as_str(),
        ])?;
    }

    writer.flush()?;
    tracing::info!("Wrote {} posts to {}", sorted.len(), path.display());
    Ok(())
}

/// Reads a posts TSV file written by `write_posts`
///
/// Columns are matched by name, so extra or reordered columns are fine.
/// Rows without a title or a parsable date are skipped.
pub fn read_posts(path: &Path) -> OutputResult<Vec<Post>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (board_idx, title_idx, date_idx) = match (column("board_id"), column("title"), column("date")) {
        (Some(b), Some(t), Some(d)) => (b, t, d),
        _ => {
            return Err(OutputError::Format(format!(
                "{} lacks one of the board_id, title, date columns",
                path.display()
            )))
        }
    };
    let page_idx = column("page");
    let post_id_idx = column("post_id");
    let author_idx = column("author");
    let replies_idx = column("replies");
    let views_idx = column("views");

    let mut posts = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
        };

        let title = field(Some(title_idx));
        let date = match NaiveDateTime::parse_from_str(field(Some(date_idx)), DATE_FORMAT) {
            Ok(date) if !title.is_empty() => date,
            _ => {
                tracing::warn!("Skipping row {} of {}", line + 2, path.display());
                continue;
            }
        };

        posts.push(Post {
            board_id: BoardId::new(field(Some(board_idx))),
            page: field(page_idx).parse().unwrap_or(1),
            post_id: field(post_id_idx).to_string(),
            title: title.to_string(),
            author: field(author_idx).to_string(),
            date,
            replies: field(replies_idx).parse().unwrap_or(0),
            views: field(views_idx).parse().unwrap_or(0),
        });
    }

    tracing::info!("Read {} posts from {}", posts.len(), path.display());
    Ok(posts)
}

/// Writes the merged table as TSV
///
/// Rows may be wider or narrower than the header when outputs disagreed.
pub fn write_table(table: &MergedTable, path: &Path) -> OutputResult<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quote_style(QuoteStyle::Never)
        .from_path(path)?;

    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} table rows to {}", table.len(), path.display());
    Ok(())
}
