use crate::data_structures::{StockData, StockQuery};
use crate::error::FetchError;
use async_trait::async_trait;

/// A source of daily price history and company metadata.
///
/// Implementations perform one fetch per call; callers never retry.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human readable provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches daily rows in `[start, end)` plus a metadata snapshot.
    ///
    /// An empty row sequence is a valid answer here; callers decide how to
    /// present it.
    async fn fetch(&self, query: &StockQuery) -> Result<StockData, FetchError>;
}
