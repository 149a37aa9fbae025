use crate::api::Record;
use crate::format::{format_cell, format_timestamp, TimeMode};

pub const TIMESTAMP_COLUMN: &str = "t";

pub const PREFERRED_COLUMNS: [&str; 10] = [
    "t",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "return_pct_1d",
    "log_return_1d",
    "cum_return",
    "drawdown",
];

const NO_DATA: &str = "No data";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn no_data() -> Self {
        Self {
            columns: vec![NO_DATA.to_string()],
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Preferred columns present in `first`, then its remaining keys in record order.
pub fn select_columns(first: &Record) -> Vec<String> {
    let mut cols: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|c| first.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    let extra: Vec<String> = first
        .keys()
        .filter(|k| !PREFERRED_COLUMNS.contains(&k.as_str()))
        .cloned()
        .collect();
    cols.extend(extra);
    cols
}

/// Columns come from the first record only: later fields outside that set are
/// dropped and missing ones render empty.
pub fn render_table(records: &[Record], mode: TimeMode) -> TableView {
    let Some(first) = records.first() else {
        return TableView::no_data();
    };
    let columns = select_columns(first);
    let rows = records
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| {
                    if c == TIMESTAMP_COLUMN {
                        format_timestamp(r.get(c), mode)
                    } else {
                        format_cell(r.get(c))
                    }
                })
                .collect()
        })
        .collect();
    TableView { columns, rows }
}
