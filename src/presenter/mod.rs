//! Turns fetched rows and metadata into display-ready widgets.

pub mod chart;
pub mod export;
pub mod metrics;
pub mod table;

pub use chart::{CandlePoint, CandlestickChart};
pub use export::{csv_file_name, read_csv, write_csv};
pub use metrics::{metric_cards, MetricCard, PLACEHOLDER};
pub use table::{PriceTable, TableRow};
