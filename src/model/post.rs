use crate::model::BoardId;
use chrono::NaiveDateTime;
use std::fmt;

/// Display format used for post dates in every output
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A listing scraped from one board page
///
/// A `Post` always has a non-empty title and a parsed date; records missing
/// either never leave the parser (see `PostDraft::finish`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub board_id: BoardId,
    /// 1-based page number the post was found on
    pub page: u32,
    /// Site-assigned identifier, empty when the link carried none
    pub post_id: String,
    pub title: String,
    pub author: String,
    /// Site-local wall clock time
    pub date: NaiveDateTime,
    pub replies: u64,
    pub views: u64,
}

impl Post {
    /// Formats the post date for TSV and prompt output
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Why a candidate record was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingTitle,
    MissingDate,
    UnparsableDate(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => f.write_str("missing title"),
            Self::MissingDate => f.write_str("missing date"),
            Self::UnparsableDate(raw) => write!(f, "unparsable date '{}'", raw),
        }
    }
}

/// Loosely filled candidate record, validated into a `Post`
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub post_id: String,
    pub title: String,
    pub author: String,
    /// Raw date text as found on the page
    pub date_text: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub replies: u64,
    pub views: u64,
}

impl PostDraft {
    /// Validates the draft; title and date are mandatory
    pub fn finish(self, board_id: &BoardId, page: u32) -> Result<Post, SkipReason> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(SkipReason::MissingTitle);
        }

        let date = match (self.date, self.date_text) {
            (Some(date), _) => date,
            (None, Some(raw)) => return Err(SkipReason::UnparsableDate(raw)),
            (None, None) => return Err(SkipReason::MissingDate),
        };

        Ok(Post {
            board_id: board_id.clone(),
            page,
            post_id: self.post_id,
            title,
            author: self.author.trim().to_string(),
            date,
            replies: self.replies,
            views: self.views,
        })
    }
}
