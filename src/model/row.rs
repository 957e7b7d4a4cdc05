use once_cell::sync::Lazy;
use regex::Regex;

/// Column names of the extraction table, in documented order
pub const TABLE_COLUMNS: [&str; 11] = [
    "original_title",
    "intent",
    "item_name",
    "price_description",
    "numeric_price",
    "price_type",
    "quantity_description",
    "condition_description",
    "board_id",
    "board_name",
    "date",
];

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("valid number regex")
});

/// What the poster wants to do with the item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Acquire,
    Sell,
    Other,
}

impl Intent {
    /// Parses the intent cell; anything unrecognised is `Other`
    pub fn from_cell(cell: &str) -> Self {
        match cell.trim().to_lowercase().as_str() {
            "acquire" | "buy" | "收购" | "求购" => Self::Acquire,
            "sell" | "出售" => Self::Sell,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acquire => "acquire",
            Self::Sell => "sell",
            Self::Other => "other",
        }
    }
}

/// Which side of the market a quoted price belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceType {
    BuyPrice,
    SellPrice,
    NotApplicable,
}

impl PriceType {
    pub fn from_cell(cell: &str) -> Self {
        match cell.trim().to_lowercase().as_str() {
            "buy_price" | "收购价" => Self::BuyPrice,
            "sell_price" | "出售价" => Self::SellPrice,
            _ => Self::NotApplicable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuyPrice => "buy_price",
            Self::SellPrice => "sell_price",
            Self::NotApplicable => "n/a",
        }
    }
}

/// Extracts the numeric price from a cell
///
/// Ranges and lists resolve to their first number: "5-10" is 5, "428, 698"
/// is 428. Thousands separators are accepted ("1,060" is 1060).
pub fn parse_numeric_price(cell: &str) -> Option<f64> {
    let found = NUMBER.find(cell)?;
    found.as_str().replace(',', "").parse().ok()
}

/// One structured market record from the merged extraction table
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRow {
    pub original_title: String,
    pub intent: Intent,
    pub item_name: String,
    pub price_description: String,
    pub numeric_price: Option<f64>,
    pub price_type: PriceType,
    pub quantity_description: String,
    pub condition_description: String,
    pub board_id: String,
    pub board_name: String,
    pub date: String,
}

impl ExtractionRow {
    /// Builds a typed row from raw cells, resolving columns by header name
    ///
    /// Returns `None` when the header has no `original_title` column or the
    /// row has no title. Missing optional columns are left empty. When the
    /// numeric price cell holds no number the price description is tried.
    pub fn from_cells(header: &[String], cells: &[String]) -> Option<Self> {
        let cell = |name: &str| -> String {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .and_then(|idx| cells.get(idx))
                .map(|c| c.trim().to_string())
                .unwrap_or_default()
        };

        let original_title = cell("original_title");
        if original_title.is_empty() {
            return None;
        }

        let price_description = cell("price_description");
        let numeric_price = parse_numeric_price(&cell("numeric_price"))
            .or_else(|| parse_numeric_price(&price_description));

        let board_id = cell("board_id");
        let mut board_name = cell("board_name");
        if board_name.is_empty() {
            board_name = board_id.clone();
        }

        Some(Self {
            original_title,
            intent: Intent::from_cell(&cell("intent")),
            item_name: cell("item_name"),
            price_description,
            numeric_price,
            price_type: PriceType::from_cell(&cell("price_type")),
            quantity_description: cell("quantity_description"),
            condition_description: cell("condition_description"),
            board_id,
            board_name,
            date: cell("date"),
        })
    }
}
