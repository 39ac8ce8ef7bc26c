use crate::data_structures::PriceRow;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

pub const CHART_TITLE: &str = "Stock Price History";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandlePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// One candlestick mark per row, keyed by date. The layout is static: fixed
/// title and axis labels, range slider hidden.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandlestickChart {
    pub title: &'static str,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub range_slider: bool,
    pub points: Vec<CandlePoint>,
}

impl CandlestickChart {
    pub fn from_rows(rows: &[PriceRow]) -> Self {
        let points = rows
            .iter()
            .map(|row| CandlePoint {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
            })
            .collect();

        Self {
            title: CHART_TITLE,
            x_title: "Date",
            y_title: "Price",
            range_slider: false,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Plotly figure description consumed by the page's plotly.js.
    pub fn to_plotly(&self) -> Value {
        let column = |f: fn(&CandlePoint) -> f64| self.points.iter().map(f).collect::<Vec<_>>();
        let dates: Vec<String> = self.points.iter().map(|p| p.date.to_string()).collect();

        json!({
            "data": [{
                "type": "candlestick",
                "name": "Price",
                "x": dates,
                "open": column(|p| p.open),
                "high": column(|p| p.high),
                "low": column(|p| p.low),
                "close": column(|p| p.close),
            }],
            "layout": {
                "title": { "text": self.title },
                "xaxis": {
                    "title": { "text": self.x_title },
                    "rangeslider": { "visible": self.range_slider },
                },
                "yaxis": { "title": { "text": self.y_title } },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<PriceRow> {
        vec![
            PriceRow::new(NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(), 130.28, 130.9, 124.17, 125.07, 1),
            PriceRow::new(NaiveDate::from_ymd_opt(2023, 1, 4).unwrap(), 126.89, 128.66, 125.08, 126.36, 2),
        ]
    }

    #[test]
    fn test_one_point_per_row() {
        let rows = rows();
        let chart = CandlestickChart::from_rows(&rows);
        assert_eq!(chart.len(), rows.len());
        for (point, row) in chart.points.iter().zip(&rows) {
            assert_eq!(point.date, row.date);
            assert_eq!((point.open, point.high, point.low, point.close), (row.open, row.high, row.low, row.close));
        }
    }

    #[test]
    fn test_plotly_figure() {
        let figure = CandlestickChart::from_rows(&rows()).to_plotly();
        let trace = &figure["data"][0];
        assert_eq!(trace["type"], "candlestick");
        assert_eq!(trace["x"][1], "2023-01-04");
        assert_eq!(trace["close"][0], 125.07);
        assert_eq!(figure["layout"]["xaxis"]["rangeslider"]["visible"], false);
        assert_eq!(figure["layout"]["title"]["text"], CHART_TITLE);
    }
}
