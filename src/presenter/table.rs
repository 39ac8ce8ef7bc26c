use super::export::record;
use crate::data_structures::PriceRow;
use serde::Serialize;

pub use super::export::COLUMNS;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
}

/// The full row sequence, unchanged and in chronological order, as text cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<TableRow>,
}

impl PriceTable {
    pub fn from_rows(rows: &[PriceRow]) -> Self {
        Self {
            columns: COLUMNS.to_vec(),
            rows: rows.iter().map(table_row).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn table_row(row: &PriceRow) -> TableRow {
    TableRow { cells: record(row) }
}
