use crate::data_structures::{PriceRow, DATE_FORMAT};
use std::io;

pub const COLUMNS: [&str; 8] = ["Date", "Open", "High", "Low", "Close", "Volume", "Dividends", "Stock Splits"];
pub const CSV_CONTENT_TYPE: &str = "text/csv";

pub fn csv_file_name(symbol: &str) -> String {
    format!("{}_stock_data.csv", symbol)
}

/// Text fields for one row, shared by the table view and the CSV export.
pub fn record(row: &PriceRow) -> Vec<String> {
    vec![
        row.date.format(DATE_FORMAT).to_string(),
        row.open.to_string(),
        row.high.to_string(),
        row.low.to_string(),
        row.close.to_string(),
        row.volume.to_string(),
        row.dividends.to_string(),
        row.stock_splits.to_string(),
    ]
}

/// Serializes rows to CSV with a header line and the date index first.
pub fn write_csv(rows: &[PriceRow]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(record(row))?;
    }

    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Parses a blob produced by `write_csv` back into rows.
pub fn read_csv(data: &str) -> Result<Vec<PriceRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    reader.deserialize().collect()
}
