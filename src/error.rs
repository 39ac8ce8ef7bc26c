use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use thiserror::Error;

/// Rejections raised while building a `StockQuery`.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Please enter a stock symbol.")]
    EmptySymbol,
    #[error("Start date must be on or before end date.")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("Invalid date '{0}', expected YYYY-MM-DD.")]
    InvalidDate(String),
}

/// Anything that went wrong talking to the market-data provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("no data returned")]
    NoData,
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::InvalidResponse(error.to_string())
    }
}

/// Errors surfaced by the download and JSON endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("Error fetching data for {symbol}: {source}")]
    Fetch { symbol: String, source: FetchError },
    #[error("Unable to fetch stock data. Please check the symbol and try again.")]
    Empty,
    #[error("failed to encode CSV: {0}")]
    Export(#[from] csv::Error),
    #[error("failed to render page: {0}")]
    Render(#[from] minijinja::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Fetch { .. } | ApiError::Empty => StatusCode::BAD_GATEWAY,
            ApiError::Export(_) | ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
