use crate::config::ProviderConfig;
use crate::data_structures::{normalize_rows, CompanyInfo, PriceRow, StockData, StockQuery};
use crate::error::FetchError;
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

// --- Chart endpoint schema ---

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: Option<String>,
    description: Option<String>,
}

impl ProviderErrorBody {
    fn message(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{}: {}", code, description),
            (None, Some(description)) => description.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown provider error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
    #[serde(default)]
    events: ChartEvents,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    exchange_name: Option<String>,
    exchange_timezone_name: Option<String>,
    regular_market_price: Option<f64>,
    fifty_two_week_high: Option<f64>,
    long_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

// --- quoteSummary endpoint schema ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetailModule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    regular_market_price: RawValue,
    #[serde(default)]
    market_cap: RawValue,
    long_name: Option<String>,
    currency: Option<String>,
    exchange_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    #[serde(default, rename = "trailingPE")]
    trailing_pe: RawValue,
    #[serde(default)]
    fifty_two_week_high: RawValue,
    #[serde(default)]
    market_cap: RawValue,
}

// Yahoo wraps numbers as {"raw": 1.0, "fmt": "1.00"} and sends {} when absent
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Parses a chart response into rows within `[start, end)` and the metadata
/// carried by the chart's `meta` block.
pub fn parse_chart_response(
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(Vec<PriceRow>, CompanyInfo), FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        return Err(FetchError::Provider(error.message()));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut results| if results.is_empty() { None } else { Some(results.swap_remove(0)) })
        .ok_or(FetchError::NoData)?;

    let tz: Tz = match result.meta.exchange_timezone_name.as_deref() {
        Some(name) => name.parse().unwrap_or_else(|_| {
            warn!(timezone = name, "Unknown exchange timezone, falling back to UTC");
            Tz::UTC
        }),
        None => Tz::UTC,
    };
    let to_local_date = |timestamp: i64| -> Result<NaiveDate, FetchError> {
        DateTime::from_timestamp(timestamp, 0)
            .map(|time| time.with_timezone(&tz).date_naive())
            .ok_or_else(|| FetchError::InvalidResponse(format!("Cannot convert timestamp {}", timestamp)))
    };

    let mut dividends: HashMap<NaiveDate, f64> = HashMap::new();
    for event in result.events.dividends.values() {
        *dividends.entry(to_local_date(event.date)?).or_default() += event.amount;
    }
    let mut splits: HashMap<NaiveDate, f64> = HashMap::new();
    for event in result.events.splits.values() {
        if event.denominator != 0.0 {
            splits.insert(to_local_date(event.date)?, event.numerator / event.denominator);
        }
    }

    let series = result.indicators.quote.into_iter().next().unwrap_or_default();
    let pick = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut rows = Vec::with_capacity(result.timestamp.len());
    for (i, &timestamp) in result.timestamp.iter().enumerate() {
        let date = to_local_date(timestamp)?;
        if date < start || date >= end {
            continue;
        }

        let (Some(open), Some(high), Some(low), Some(close)) = (
            pick(&series.open, i),
            pick(&series.high, i),
            pick(&series.low, i),
            pick(&series.close, i),
        ) else {
            debug!(%date, "Skipping row with missing prices");
            continue;
        };
        let volume = pick(&series.volume, i).map(|v| v.max(0.0).round() as u64).unwrap_or(0);

        let mut row = PriceRow::new(date, open, high, low, close, volume);
        row.dividends = dividends.get(&date).copied().unwrap_or(0.0);
        row.stock_splits = splits.get(&date).copied().unwrap_or(0.0);
        rows.push(row);
    }

    let info = CompanyInfo {
        current_price: result.meta.regular_market_price,
        market_cap: None,
        trailing_pe: None,
        fifty_two_week_high: result.meta.fifty_two_week_high,
        long_name: result.meta.long_name,
        currency: result.meta.currency,
        exchange: result.meta.exchange_name,
    };

    Ok((normalize_rows(rows), info))
}

/// Parses a quoteSummary response holding the `price` and `summaryDetail`
/// modules.
pub fn parse_summary_response(body: &str) -> Result<CompanyInfo, FetchError> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.quote_summary.error {
        return Err(FetchError::Provider(error.message()));
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(FetchError::NoData)?;

    Ok(CompanyInfo {
        current_price: result.price.regular_market_price.raw,
        market_cap: result.price.market_cap.raw.or(result.summary_detail.market_cap.raw),
        trailing_pe: result.summary_detail.trailing_pe.raw,
        fifty_two_week_high: result.summary_detail.fifty_two_week_high.raw,
        long_name: result.price.long_name,
        currency: result.price.currency,
        exchange: result.price.exchange_name,
    })
}

fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|datetime| datetime.and_utc().timestamp())
        .unwrap_or_default()
}

pub struct YahooClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    user_agents: Vec<String>,
    random_agent: bool,
}

impl YahooClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().cookie_store(true).gzip(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(YahooClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url.clone(),
            user_agents,
            random_agent: config.random_agent,
        })
    }

    fn get_user_agent(&self) -> String {
        if self.random_agent {
            use rand::seq::IndexedRandom;
            self.user_agents
                .choose(&mut rand::rng())
                .unwrap_or(&self.user_agents[0])
                .clone()
        } else {
            self.user_agents[0].clone()
        }
    }

    // Single attempt: no retry, no backoff
    async fn make_request(&self, url: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("User-Agent", self.get_user_agent())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        // Yahoo reports unknown symbols as 404 with an error envelope
        if let Ok(envelope) = serde_json::from_str::<ChartEnvelope>(&body) {
            if let Some(error) = envelope.chart.error {
                return Err(FetchError::Provider(error.message()));
            }
        }
        Err(FetchError::Status(status))
    }

    pub async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Vec<PriceRow>, CompanyInfo), FetchError> {
        // pad by a day so exchange-local dates at either edge are covered
        let period1 = midnight_timestamp(start - ChronoDuration::days(1));
        let period2 = midnight_timestamp(end + ChronoDuration::days(1));

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let params = [
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "div,splits".to_string()),
            ("includePrePost", "false".to_string()),
        ];

        debug!(symbol, period1, period2, "Requesting chart history");
        let body = self.make_request(&url, &params).await?;
        parse_chart_response(&body, start, end)
    }

    async fn fetch_crumb(&self) -> Result<String, FetchError> {
        // sets the session cookie; the response status is irrelevant
        if let Err(e) = self
            .client
            .get(&self.cookie_url)
            .header("User-Agent", self.get_user_agent())
            .send()
            .await
        {
            debug!(error = %e, "Cookie request failed");
        }

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let crumb = self.make_request(&url, &[]).await?;
        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(FetchError::InvalidResponse("empty crumb".to_string()));
        }
        Ok(crumb)
    }

    pub async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, FetchError> {
        let crumb = self.fetch_crumb().await?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let params = [
            ("modules", "price,summaryDetail".to_string()),
            ("crumb", crumb),
        ];

        let body = self.make_request(&url, &params).await?;
        parse_summary_response(&body)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(skip(self, query), fields(symbol = %query.symbol()))]
    async fn fetch(&self, query: &StockQuery) -> Result<StockData, FetchError> {
        let symbol = query.symbol();
        let (rows, chart_info) = self
            .get_history(symbol, query.start_date(), query.end_date())
            .await?;

        if rows.is_empty() {
            debug!("No rows in range, skipping metadata request");
            return Ok(StockData { symbol: symbol.to_string(), rows, info: chart_info });
        }

        let info = match self.company_info(symbol).await {
            Ok(mut info) => {
                info.merge_missing(chart_info);
                info
            }
            Err(e) => {
                warn!(error = %e, "Company metadata unavailable, using chart metadata only");
                chart_info
            }
        };

        info!(rows = rows.len(), "Fetched price history");
        Ok(StockData { symbol: symbol.to_string(), rows, info })
    }
}
