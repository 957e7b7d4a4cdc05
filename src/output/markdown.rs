//! Markdown summary generation
//!
//! The summary is what the notifier delivers: an overview of the collected
//! posts, the merged extraction table (or, without one, the board
//! distribution and newest posts), and a link to the published data.

use crate::merge::MergedTable;
use crate::model::{BoardNames, ExtractionRow, Intent};
use crate::output::stats::PostStatistics;
use crate::output::OutputResult;
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Table rows rendered before the rest is elided
const MAX_TABLE_ROWS: usize = 50;

/// Everything the summary is rendered from
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    pub stats: &'a PostStatistics,
    /// Merged extraction table, if analysis ran and produced one
    pub table: Option<&'a MergedTable>,
    pub names: &'a BoardNames,
    /// `owner/name` of the repository the data files are published to
    pub repository: Option<&'a str>,
    /// File name linked from the summary
    pub data_file: &'a str,
    pub date: NaiveDate,
}

/// Writes a rendered summary to disk
///
/// # Arguments
///
/// * `content` - The markdown text
/// * `output_path` - Path where the markdown file should be written
pub fn write_summary(content: &str, output_path: &Path) -> OutputResult<()> {
    let mut file = File::create(output_path)?;
    file.write_all(content.as_bytes())?;
    tracing::info!("Summary written to {}", output_path.display());
    Ok(())
}

/// Formats the run summary as markdown
pub fn format_summary(ctx: &SummaryContext<'_>) -> String {
    let mut md = String::new();

    md.push_str(&format!("### Board-Harvest update ({})\n\n", ctx.date.format("%Y-%m-%d")));

    md.push_str("**Overview**:\n");
    md.push_str(&format!("- Total posts: {}\n", ctx.stats.total_posts));
    md.push_str(&format!("- Date range: {}\n", ctx.stats.date_range_label()));

    match ctx.table.filter(|t| !t.is_empty()) {
        Some(table) => {
            md.push_str(&market_overview(&table.typed_rows()));
            md.push_str(&format!("\n**Market table** ({} rows):\n\n", table.len()));
            md.push_str(&markdown_table(table));
        }
        None => {
            if !ctx.stats.board_counts.is_empty() {
                md.push_str("\n**Board distribution**:\n");
                for (board, count) in ctx.stats.board_counts.iter().take(5) {
                    md.push_str(&format!(
                        "- {} ({}): {} posts\n",
                        ctx.names.lookup(board.as_str()),
                        board,
                        count
                    ));
                }
            }

            if !ctx.stats.recent.is_empty() {
                md.push_str("\n**Newest posts**:\n");
                for post in ctx.stats.recent.iter().take(3) {
                    let author = if post.author.is_empty() {
                        "unknown"
                    } else {
                        post.author.as_str()
                    };
                    md.push_str(&format!(
                        "- {} (author: {}, date: {})\n",
                        post.title,
                        author,
                        post.date_string()
                    ));
                }
            }
        }
    }

    if let Some(repo) = ctx.repository.filter(|r| !r.is_empty()) {
        md.push_str(&format!(
            "\n**Full data**: [GitHub repository]({})\n",
            data_url(repo, ctx.data_file)
        ));
    }

    md
}

/// Link to a data file on the repository's main branch
pub fn data_url(repository: &str, data_file: &str) -> String {
    let file_name = Path::new(data_file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| data_file.to_string());
    format!("https://github.com/{}/blob/main/{}", repository, file_name)
}

/// Overview lines counting listings by intent and quoted price
fn market_overview(rows: &[ExtractionRow]) -> String {
    let count = |intent: Intent| rows.iter().filter(|r| r.intent == intent).count();
    let priced = rows.iter().filter(|r| r.numeric_price.is_some()).count();

    format!(
        "- Listings: {} selling, {} acquiring, {} other\n- Priced listings: {}\n",
        count(Intent::Sell),
        count(Intent::Acquire),
        count(Intent::Other),
        priced
    )
}

fn markdown_table(table: &MergedTable) -> String {
    let mut md = String::new();
    let width = table.header.len();

    md.push_str(&format!("| {} |\n", escape_row(&table.header)));
    md.push_str(&format!("|{}\n", "---|".repeat(width)));

    for row in table.rows.iter().take(MAX_TABLE_ROWS) {
        let mut cells: Vec<String> = row.iter().take(width).cloned().collect();
        cells.resize(width, String::new());
        md.push_str(&format!("| {} |\n", escape_row(&cells)));
    }

    if table.len() > MAX_TABLE_ROWS {
        md.push_str(&format!("\n_{} more rows in the table file_\n", table.len() - MAX_TABLE_ROWS));
    }
    md
}

fn escape_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| c.replace('|', "\\|"))
        .collect::<Vec<_>>()
        .join(" | ")
}
