//! Merging of extraction outputs into one table
//!
//! Each successful batch output is free text that should contain a TSV
//! table. Merging:
//!
//! 1. extracts the table block of every output (`block`)
//! 2. keeps the first header as canonical
//! 3. concatenates rows in first-seen order, padding short ones
//! 4. fills `board_name` from `board_id` through the board name lookup
//! 5. rewrites intent, price type and numeric price in canonical form
//! 6. drops untitled rows and exact duplicates
//!
//! Outputs without a usable block are skipped; if none has one the merged
//! table is empty.

mod block;
mod table;

pub use block::{extract_block, is_failure_line, is_header_line, TableBlock, FAILURE_MARKERS};
pub use table::MergedTable;

use crate::model::BoardNames;
use std::collections::HashSet;

/// Merges extraction outputs into one deduplicated table
///
/// # Arguments
///
/// * `outputs` - Successful batch outputs in submission order
/// * `names` - Board id to display name lookup
pub fn merge_outputs<S: AsRef<str>>(outputs: &[S], names: &BoardNames) -> MergedTable {
    let mut table = MergedTable::default();
    let mut blocks = 0usize;

    for (position, output) in outputs.iter().enumerate() {
        let block = match extract_block(output.as_ref()) {
            Some(block) => block,
            None => {
                tracing::debug!("Output {} holds no table block", position + 1);
                continue;
            }
        };
        blocks += 1;

        if table.header.is_empty() {
            table.header = block.header;
        } else if block.header != table.header {
            tracing::warn!(
                "Output {} header differs from the first one ({} vs {} columns); rows kept as-is",
                position + 1,
                block.header.len(),
                table.header.len()
            );
        }

        table.rows.extend(block.rows);
    }

    if table.is_empty() {
        tracing::warn!("No table block found in {} outputs", outputs.len());
        return table;
    }

    table.pad_rows();
    table.apply_board_names(names);
    let untitled = table.normalize_fields();
    if untitled > 0 {
        tracing::debug!("Dropped {} rows without a title", untitled);
    }

    let before = table.rows.len();
    let mut seen = HashSet::new();
    table.rows.retain(|row| seen.insert(row.clone()));

    tracing::info!(
        "Merged {} blocks: {} rows ({} duplicates removed)",
        blocks,
        table.rows.len(),
        before - table.rows.len()
    );

    table
}
