use chrono::NaiveDate;
use stockview::config::ProviderConfig;
use stockview::data_structures::StockQuery;
use stockview::presenter::{metric_cards, write_csv, CandlestickChart};
use stockview::provider::MarketDataProvider;
use stockview::yahoo::YahooClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Yahoo Client Example");
    println!("====================");

    let client = YahooClient::new(&ProviderConfig::default())?;
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default();
    let end = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap_or_default();
    let query = StockQuery::new("AAPL", start, end)?;

    match client.fetch(&query).await {
        Ok(data) => {
            println!("\n🏢 Key Financial Information for {}", data.symbol);
            println!("{}", "-".repeat(40));
            for card in metric_cards(&data.info) {
                println!("  {:<14} {}", card.label, card.value);
            }

            println!("\n📈 {} trading days", data.rows.len());
            if let (Some(first), Some(last)) = (data.rows.first(), data.rows.last()) {
                let change_pct = ((last.close - first.open) / first.open) * 100.0;
                println!("📅 Range: {} to {} | Change: {:+.2}%", first.date, last.date, change_pct);
            }

            let chart = CandlestickChart::from_rows(&data.rows);
            println!("🕯️ Chart points: {}", chart.len());

            let csv = write_csv(&data.rows)?;
            println!("\n{}", csv);
        }
        Err(e) => println!("❌ Failed to retrieve data: {}", e),
    }

    Ok(())
}
