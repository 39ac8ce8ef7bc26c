use crate::data_structures::CompanyInfo;
use serde::Serialize;

pub const PLACEHOLDER: &str = "N/A";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

impl MetricCard {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }

    pub fn is_placeholder(&self) -> bool {
        self.value == PLACEHOLDER
    }
}

/// Builds the four key metric cards. Each card falls back to `N/A` on its
/// own when its value is missing or not a finite number.
pub fn metric_cards(info: &CompanyInfo) -> Vec<MetricCard> {
    vec![
        MetricCard::new("Current Price", format_currency(info.current_price)),
        MetricCard::new("Market Cap", format_billions(info.market_cap)),
        MetricCard::new("P/E Ratio", format_ratio(info.trailing_pe)),
        MetricCard::new("52 Week High", format_currency(info.fifty_two_week_high)),
    ]
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

pub fn format_currency(value: Option<f64>) -> String {
    finite(value).map_or_else(|| PLACEHOLDER.to_string(), |v| format!("${:.2}", v))
}

pub fn format_billions(value: Option<f64>) -> String {
    finite(value).map_or_else(|| PLACEHOLDER.to_string(), |v| format!("${:.2}B", v / 1e9))
}

pub fn format_ratio(value: Option<f64>) -> String {
    finite(value).map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{:.2}", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_info() {
        let info = CompanyInfo {
            current_price: Some(130.154),
            market_cap: Some(2_070_000_000_000.0),
            trailing_pe: Some(21.9),
            fifty_two_week_high: Some(179.61),
            ..Default::default()
        };
        let values: Vec<_> = metric_cards(&info).into_iter().map(|c| c.value).collect();
        assert_eq!(values, vec!["$130.15", "$2070.00B", "21.90", "$179.61"]);
    }

    #[test]
    fn test_each_missing_field_is_independent() {
        let info = CompanyInfo {
            current_price: Some(10.0),
            trailing_pe: None,
            market_cap: None,
            fifty_two_week_high: Some(12.5),
            ..Default::default()
        };
        let cards = metric_cards(&info);
        assert_eq!(cards[0].value, "$10.00");
        assert!(cards[1].is_placeholder());
        assert!(cards[2].is_placeholder());
        assert_eq!(cards[3].value, "$12.50");
    }

    #[test]
    fn test_empty_info_renders_placeholders() {
        let cards = metric_cards(&CompanyInfo::default());
        assert_eq!(cards.len(), 4);
        assert!(cards.iter().all(MetricCard::is_placeholder));
    }

    #[test]
    fn test_non_finite_is_placeholder() {
        assert_eq!(format_ratio(Some(f64::NAN)), PLACEHOLDER);
        assert_eq!(format_currency(Some(f64::INFINITY)), PLACEHOLDER);
    }
}
