//! Statistics over the collected posts
//!
//! This module provides the summary figures shown on the console and in the
//! markdown summary.

use crate::model::{BoardId, BoardNames, Post};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Post collection summary
#[derive(Debug, Clone, Default)]
pub struct PostStatistics {
    /// Total number of posts
    pub total_posts: usize,

    /// Posts per board, largest first
    pub board_counts: Vec<(BoardId, usize)>,

    /// Oldest and newest post dates
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,

    /// The five newest posts
    pub recent: Vec<Post>,

    /// The three posts with the most replies
    pub most_replied: Vec<Post>,

    /// The three posts with the most views
    pub most_viewed: Vec<Post>,
}

impl PostStatistics {
    /// Computes statistics for a set of posts
    ///
    /// Rankings are stable: ties keep the input order.
    pub fn from_posts(posts: &[Post]) -> Self {
        if posts.is_empty() {
            return Self::default();
        }

        let mut counts: HashMap<&BoardId, usize> = HashMap::new();
        for post in posts {
            *counts.entry(&post.board_id).or_insert(0) += 1;
        }
        let mut board_counts: Vec<(BoardId, usize)> = counts
            .into_iter()
            .map(|(id, count)| (id.clone(), count))
            .collect();
        board_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let oldest = posts.iter().map(|p| p.date).min();
        let newest = posts.iter().map(|p| p.date).max();

        Self {
            total_posts: posts.len(),
            board_counts,
            date_range: oldest.zip(newest),
            recent: top_by(posts, 5, |p| p.date),
            most_replied: top_by(posts, 3, |p| p.replies),
            most_viewed: top_by(posts, 3, |p| p.views),
        }
    }

    /// Formats the date range as `YYYY-MM-DD to YYYY-MM-DD`
    pub fn date_range_label(&self) -> String {
        match self.date_range {
            Some((from, to)) => format!("{} to {}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d")),
            None => "unknown".to_string(),
        }
    }
}

/// The `n` largest posts by key, ties in input order
fn top_by<K: Ord>(posts: &[Post], n: usize, key: impl Fn(&Post) -> K) -> Vec<Post> {
    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by(|a, b| key(b).cmp(&key(a)));
    ranked.into_iter().take(n).cloned().collect()
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `names` - Board display names
pub fn print_statistics(stats: &PostStatistics, names: &BoardNames) {
    println!("=== Post Statistics ===\n");

    println!("Overview:");
    println!("  Total posts: {}", stats.total_posts);
    println!("  Date range: {}", stats.date_range_label());
    println!();

    if !stats.board_counts.is_empty() {
        println!("Posts by Board:");
        for (board, count) in &stats.board_counts {
            let percentage = (*count as f64 / stats.total_posts as f64) * 100.0;
            println!(
                "  {} ({}): {} ({:.1}%)",
                names.lookup(board.as_str()),
                board,
                count,
                percentage
            );
        }
        println!();
    }

    print_ranking("Most Recent", &stats.recent, |p| p.date_string());
    print_ranking("Most Replied", &stats.most_replied, |p| {
        format!("{} replies", p.replies)
    });
    print_ranking("Most Viewed", &stats.most_viewed, |p| format!("{} views", p.views));
}

fn print_ranking(title: &str, posts: &[Post], detail: impl Fn(&Post) -> String) {
    if posts.is_empty() {
        return;
    }
    println!("{}:", title);
    for post in posts {
        println!("  - [{}] {} ({})", post.board_id, post.title, detail(post));
    }
    println!();
}
