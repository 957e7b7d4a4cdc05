//! Record types shared by the crawler, the analysis pool and the merger
//!
//! - `Post`: one listing scraped from a board page
//! - `ExtractionRow`: one structured market record parsed from a merged table
//! - `BoardId` / `BoardNames`: board identifiers and their display names

mod board;
mod post;
mod row;

pub use board::{BoardId, BoardNames};
pub use post::{Post, PostDraft, SkipReason, DATE_FORMAT};
pub use row::{parse_numeric_price, ExtractionRow, Intent, PriceType, TABLE_COLUMNS};
