use crate::error::QueryError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// --- Query ---

/// A validated request for one symbol over a date range.
///
/// `end_date` is exclusive when handed to the provider, matching how the
/// upstream history endpoint treats its end bound.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StockQuery {
    symbol: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl StockQuery {
    pub fn new(symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, QueryError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(QueryError::EmptySymbol);
        }
        if start_date > end_date {
            return Err(QueryError::InvalidRange { start: start_date, end: end_date });
        }
        Ok(Self { symbol, start_date, end_date })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| QueryError::InvalidDate(raw.to_string()))
}

// --- Price data ---

/// One trading day. Rows are kept in chronological order, one per date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Dividends", default)]
    pub dividends: f64,
    #[serde(rename = "Stock Splits", default)]
    pub stock_splits: f64,
}

impl PriceRow {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            dividends: 0.0,
            stock_splits: 0.0,
        }
    }
}

/// Sorts rows by date and drops earlier duplicates so the last reported row
/// for a date wins.
pub fn normalize_rows(mut rows: Vec<PriceRow>) -> Vec<PriceRow> {
    // stable sort keeps provider order within a date
    rows.sort_by_key(|row| row.date);
    let mut out: Vec<PriceRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match out.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => out.push(row),
        }
    }
    out
}

// --- Company metadata ---

/// Sparse metadata snapshot. Any field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub long_name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
}

impl CompanyInfo {
    /// Fills fields that are missing here from `other`.
    pub fn merge_missing(&mut self, other: CompanyInfo) {
        self.current_price = self.current_price.or(other.current_price);
        self.market_cap = self.market_cap.or(other.market_cap);
        self.trailing_pe = self.trailing_pe.or(other.trailing_pe);
        self.fifty_two_week_high = self.fifty_two_week_high.or(other.fifty_two_week_high);
        self.long_name = self.long_name.take().or(other.long_name);
        self.currency = self.currency.take().or(other.currency);
        self.exchange = self.exchange.take().or(other.exchange);
    }
}

/// Result of one successful fetch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockData {
    pub symbol: String,
    pub rows: Vec<PriceRow>,
    pub info: CompanyInfo,
}
