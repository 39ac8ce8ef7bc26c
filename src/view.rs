use crate::data_structures::{normalize_symbol, parse_date, CompanyInfo, PriceRow, StockData, StockQuery, DATE_FORMAT};
use crate::error::{ApiError, QueryError};
use crate::presenter::{csv_file_name, metric_cards, CandlestickChart, MetricCard, PriceTable};
use crate::provider::MarketDataProvider;
use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

pub const IDLE_MESSAGE: &str = "Please enter a stock symbol and select date range to view data.";
pub const UNABLE_MESSAGE: &str = "Unable to fetch stock data. Please check the symbol and try again.";

/// Raw form input as it arrives in the query string.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryParams {
    pub symbol: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Values echoed back into the input form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormValues {
    pub symbol: String,
    pub start: String,
    pub end: String,
}

impl QueryParams {
    pub fn form_values(&self, today: NaiveDate, lookback_days: i64) -> FormValues {
        let (default_start, default_end) = default_range(today, lookback_days);
        let or_default = |value: &Option<String>, fallback: NaiveDate| match value.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => fallback.format(DATE_FORMAT).to_string(),
        };

        FormValues {
            symbol: normalize_symbol(self.symbol.as_deref().unwrap_or_default()),
            start: or_default(&self.start, default_start),
            end: or_default(&self.end, default_end),
        }
    }

    /// `Ok(None)` while no symbol has been entered yet.
    pub fn to_query(&self, today: NaiveDate, lookback_days: i64) -> Result<Option<StockQuery>, QueryError> {
        let form = self.form_values(today, lookback_days);
        if form.symbol.is_empty() {
            return Ok(None);
        }
        let start = parse_date(&form.start)?;
        let end = parse_date(&form.end)?;
        StockQuery::new(&form.symbol, start, end).map(Some)
    }
}

/// Saturates at the earliest representable date instead of overflowing.
pub fn default_range(today: NaiveDate, lookback_days: i64) -> (NaiveDate, NaiveDate) {
    let start = TimeDelta::try_days(lookback_days)
        .and_then(|delta| today.checked_sub_signed(delta))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// Everything the Loaded view shows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dashboard {
    pub symbol: String,
    pub info: CompanyInfo,
    pub metrics: Vec<MetricCard>,
    pub chart: CandlestickChart,
    pub table: PriceTable,
    pub file_name: String,
    // Already carried by the table and chart in serialized output
    #[serde(skip)]
    pub rows: Vec<PriceRow>,
}

impl Dashboard {
    pub fn from_data(data: StockData) -> Self {
        Self {
            metrics: metric_cards(&data.info),
            chart: CandlestickChart::from_rows(&data.rows),
            table: PriceTable::from_rows(&data.rows),
            file_name: csv_file_name(&data.symbol),
            symbol: data.symbol,
            info: data.info,
            rows: data.rows,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState {
    Idle,
    Loaded(Box<Dashboard>),
    Failed { message: String, detail: Option<String> },
}

/// State names for logs and the JSON surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateName {
    Idle,
    Loaded,
    Failed,
}

impl StateName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateName::Idle => "IDLE",
            StateName::Loaded => "LOADED",
            StateName::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for StateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ViewState {
    pub fn name(&self) -> StateName {
        match self {
            ViewState::Idle => StateName::Idle,
            ViewState::Loaded(_) => StateName::Loaded,
            ViewState::Failed { .. } => StateName::Failed,
        }
    }

    fn rejected(error: QueryError) -> Self {
        ViewState::Failed { message: error.to_string(), detail: None }
    }
}

/// Fetches a validated query. Provider errors and empty results both fail.
pub async fn load(query: &StockQuery, provider: &dyn MarketDataProvider) -> Result<StockData, ApiError> {
    debug!(provider = provider.name(), symbol = query.symbol(), start = %query.start_date(), end = %query.end_date(), "Fetching stock data");

    let data = provider.fetch(query).await.map_err(|source| {
        error!(symbol = query.symbol(), error = %source, "Failed to fetch stock data");
        ApiError::Fetch { symbol: query.symbol().to_string(), source }
    })?;

    if data.rows.is_empty() {
        warn!(symbol = query.symbol(), "Provider returned no rows for range");
        return Err(ApiError::Empty);
    }
    Ok(data)
}

/// Runs one pass of the pipeline for the submitted form.
pub async fn evaluate(
    params: &QueryParams,
    provider: &dyn MarketDataProvider,
    today: NaiveDate,
    lookback_days: i64,
) -> ViewState {
    let state = match params.to_query(today, lookback_days) {
        Ok(None) => ViewState::Idle,
        Err(e) => {
            warn!(error = %e, "Rejected query before fetching");
            ViewState::rejected(e)
        }
        Ok(Some(query)) => match load(&query, provider).await {
            Ok(data) => ViewState::Loaded(Box::new(Dashboard::from_data(data))),
            Err(ApiError::Fetch { symbol, source }) => ViewState::Failed {
                message: UNABLE_MESSAGE.to_string(),
                detail: Some(format!("Error fetching data for {}: {}", symbol, source)),
            },
            Err(_) => ViewState::Failed { message: UNABLE_MESSAGE.to_string(), detail: None },
        },
    };

    info!(state = %state.name(), "Evaluated view");
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        rows: Vec<PriceRow>,
        info: CompanyInfo,
        fail: bool,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(rows: Vec<PriceRow>) -> Self {
            Self { rows, info: CompanyInfo::default(), fail: false, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl MarketDataProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, query: &StockQuery) -> Result<StockData, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Provider("Not Found".to_string()));
            }
            Ok(StockData { symbol: query.symbol().to_string(), rows: self.rows.clone(), info: self.info.clone() })
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn params(symbol: &str, start: &str, end: &str) -> QueryParams {
        QueryParams { symbol: Some(symbol.to_string()), start: Some(start.to_string()), end: Some(end.to_string()) }
    }

    fn five_rows() -> Vec<PriceRow> {
        [3, 4, 5, 6, 9]
            .into_iter()
            .map(|d| PriceRow::new(day(d), 1.0, 2.0, 0.5, 1.5, 100))
            .collect()
    }

    #[test]
    fn test_form_defaults_to_last_year() {
        let form = QueryParams::default().form_values(day(10), 365);
        assert_eq!(form.symbol, "");
        assert_eq!(form.start, "2022-01-10");
        assert_eq!(form.end, "2023-01-10");
    }

    #[test]
    fn test_default_range_saturates() {
        assert_eq!(default_range(day(10), i64::MAX), (NaiveDate::MIN, day(10)));
        assert_eq!(default_range(day(10), 999_999_999_999), (NaiveDate::MIN, day(10)));
        assert_eq!(default_range(day(10), 0), (day(10), day(10)));
    }

    #[tokio::test]
    async fn test_idle_without_symbol() {
        let provider = Fixed::new(five_rows());
        let state = evaluate(&QueryParams::default(), &provider, day(10), 365).await;
        assert_eq!(state, ViewState::Idle);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reversed_range_never_fetches() {
        let provider = Fixed::new(five_rows());
        let state = evaluate(&params("AAPL", "2023-02-01", "2023-01-01"), &provider, day(10), 365).await;
        assert_eq!(state.name(), StateName::Failed);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_date_never_fetches() {
        let provider = Fixed::new(five_rows());
        let state = evaluate(&params("AAPL", "yesterday", "2023-01-01"), &provider, day(10), 365).await;
        assert!(matches!(state, ViewState::Failed { ref message, .. } if message.contains("yesterday")));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_rows_fail() {
        let provider = Fixed::new(Vec::new());
        let state = evaluate(&params("AAPL", "2023-01-01", "2023-01-10"), &provider, day(10), 365).await;
        assert_eq!(state, ViewState::Failed { message: UNABLE_MESSAGE.to_string(), detail: None });
    }

    #[tokio::test]
    async fn test_provider_error_fails_with_detail() {
        let mut provider = Fixed::new(five_rows());
        provider.fail = true;
        let state = evaluate(&params("zzzz", "2023-01-01", "2023-01-10"), &provider, day(10), 365).await;
        match state {
            ViewState::Failed { message, detail } => {
                assert_eq!(message, UNABLE_MESSAGE);
                assert!(detail.unwrap().starts_with("Error fetching data for ZZZZ"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_loaded_scenario() {
        let provider = Fixed::new(five_rows());
        let state = evaluate(&params("aapl", "2023-01-01", "2023-01-10"), &provider, day(10), 365).await;
        let ViewState::Loaded(dashboard) = state else {
            panic!("expected loaded state");
        };
        assert_eq!(dashboard.symbol, "AAPL");
        assert_eq!(dashboard.table.len(), 5);
        assert_eq!(dashboard.chart.len(), 5);
        assert_eq!(dashboard.file_name, "AAPL_stock_data.csv");
        assert!(dashboard.metrics.iter().all(MetricCard::is_placeholder));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
