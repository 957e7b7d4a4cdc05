use crate::model::{BoardNames, ExtractionRow};

/// The combined extraction table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MergedTable {
    /// True when no output contained a usable table
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column, matched case-insensitively
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Renders the header and rows as tab-separated lines
    pub fn to_tsv(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = self.header.join("\t");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }

    /// Typed view of the rows that resolve against the header
    pub fn typed_rows(&self) -> Vec<ExtractionRow> {
        self.rows
            .iter()
            .filter_map(|row| ExtractionRow::from_cells(&self.header, row))
            .collect()
    }

    /// Pads every row to the header width
    pub(crate) fn pad_rows(&mut self) {
        let width = self.header.len();
        for row in &mut self.rows {
            pad(row, width);
        }
    }

    /// Rewrites the `intent`, `price_type` and `numeric_price` cells in
    /// canonical form and drops rows without a title
    ///
    /// Rows wider than the header came from a divergent header and are left
    /// untouched.
    ///
    /// # Returns
    ///
    /// The number of dropped rows
    pub(crate) fn normalize_fields(&mut self) -> usize {
        let intent_idx = self.column("intent");
        let price_type_idx = self.column("price_type");
        let numeric_idx = self.column("numeric_price");

        let before = self.rows.len();
        let header = &self.header;
        self.rows.retain_mut(|row| {
            if row.len() > header.len() {
                return true;
            }
            let typed = match ExtractionRow::from_cells(header, &row[..]) {
                Some(typed) => typed,
                None => return false,
            };

            set_cell(row, intent_idx, typed.intent.as_str().to_string());
            set_cell(row, price_type_idx, typed.price_type.as_str().to_string());
            set_cell(
                row,
                numeric_idx,
                typed.numeric_price.map(|p| p.to_string()).unwrap_or_default(),
            );
            true
        });
        before - self.rows.len()
    }

    /// Fills the `board_name` column from the `board_id` column
    ///
    /// The column is inserted right after `board_id` when missing and
    /// overwritten when present. Short rows are padded first. Tables without
    /// a `board_id` column are left alone.
    pub(crate) fn apply_board_names(&mut self, names: &BoardNames) {
        let id_idx = match self.column("board_id") {
            Some(idx) => idx,
            None => return,
        };

        let width = self.header.len();
        let name_idx = match self.column("board_name") {
            Some(idx) => idx,
            None => {
                self.header.insert(id_idx + 1, "board_name".to_string());
                for row in &mut self.rows {
                    pad(row, width);
                    row.insert(id_idx + 1, String::new());
                }
                id_idx + 1
            }
        };

        let width = self.header.len();
        for row in &mut self.rows {
            pad(row, width);
            let name = names.lookup(&row[id_idx]).to_string();
            row[name_idx] = name;
        }
    }
}

fn set_cell(row: &mut [String], idx: Option<usize>, value: String) {
    if let Some(cell) = idx.and_then(|i| row.get_mut(i)) {
        *cell = value;
    }
}

fn pad(row: &mut Vec<String>, width: usize) {
    if row.len() < width {
        row.resize(width, String::new());
    }
}
