//! Extraction instructions and the per-batch input table

use crate::model::{Post, TABLE_COLUMNS};

/// System message sent with every request
pub const SYSTEM_PROMPT: &str =
    "You are a market data assistant. You turn forum listing titles into structured, tab-separated records.";

const INSTRUCTIONS: &str = "\
Role: you analyse listings from a coin and banknote trading forum.

For every post in the table below:
1. Decide the intent: `acquire` (wants to buy: collect, seeking, buying), `sell` (offering, selling, transferring, wholesale) or `other` when unclear or mixed.
2. Extract the item name.
3. Copy every statement about price into price_description, as written (e.g. \"428 per bundle\", \"1060 out\", \"negotiable\").
4. If price_description holds an Arabic numeral put it in numeric_price; for a range keep only the first number; otherwise leave it empty.
5. Set price_type to `buy_price`, `sell_price` or `n/a` according to the intent and the price.
6. Extract quantity statements into quantity_description (e.g. \"one bundle\", \"5 tubes\", \"5-10 pieces\").
7. Extract condition or feature statements into condition_description (e.g. \"original bundle\", \"graded\", \"NGC 70\").
8. Copy board_id, board_name and date from the input unchanged, and the title verbatim into original_title.

Output format: TSV only, inside a single ```tsv fenced block.
The first line is the header, then one line per post, fields separated by a single tab character.
";

/// Header line of the expected output table
pub fn output_header() -> String {
    TABLE_COLUMNS.join("\t")
}

/// Renders the batch as a `title, board_id, board_name, date` TSV table
///
/// Tabs and line breaks inside titles are replaced with spaces so every post
/// stays on one line.
pub fn posts_table(posts: &[Post], board_name: &str) -> String {
    let mut table = String::from("title\tboard_id\tboard_name\tdate\n");
    for post in posts {
        table.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            single_line(&post.title),
            post.board_id,
            single_line(board_name),
            post.date_string()
        ));
    }
    table
}

/// Builds the user message for one batch
pub fn build_user_prompt(posts: &[Post], board_name: &str) -> String {
    format!(
        "{}\nExpected header:\n{}\n\nPosts:\n```tsv\n{}```\n",
        INSTRUCTIONS,
        output_header(),
        posts_table(posts, board_name)
    )
}

fn single_line(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}
