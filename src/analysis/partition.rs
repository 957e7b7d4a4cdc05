//! Splits accepted posts into per-board extraction batches

use crate::model::{BoardId, Post};

/// A bounded run of posts from one board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub board_id: BoardId,
    /// 0-based position within the board's batches
    pub index: usize,
    pub posts: Vec<Post>,
}

/// All batches of one board, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardBatches {
    pub board_id: BoardId,
    pub batches: Vec<Batch>,
}

/// Groups posts by board and cuts each group into batches
///
/// Boards appear in the order they are first seen and posts keep their
/// relative order. A board with `n` posts yields `ceil(n / batch_size)`
/// consecutive batches of at most `batch_size` posts. A `batch_size` of 0 is
/// treated as 1.
///
/// # Arguments
///
/// * `posts` - Accepted posts in discovery order
/// * `batch_size` - Maximum posts per batch
pub fn partition(posts: &[Post], batch_size: usize) -> Vec<BoardBatches> {
    let batch_size = batch_size.max(1);

    let mut groups: Vec<(BoardId, Vec<Post>)> = Vec::new();
    for post in posts {
        match groups.iter_mut().find(|(id, _)| *id == post.board_id) {
            Some((_, group)) => group.push(post.clone()),
            None => groups.push((post.board_id.clone(), vec![post.clone()])),
        }
    }

    groups
        .into_iter()
        .map(|(board_id, group)| {
            let batches = group
                .chunks(batch_size)
                .enumerate()
                .map(|(index, chunk)| Batch {
                    board_id: board_id.clone(),
                    index,
                    posts: chunk.to_vec(),
                })
                .collect();
            BoardBatches { board_id, batches }
        })
        .collect()
}
