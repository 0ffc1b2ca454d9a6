//! Daily price bar.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_compare_by_value() {
        let bar = DailyBar {
            ticker: "BTC-USD".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        };
        let mut other = bar.clone();
        assert_eq!(bar, other);
        other.close = 106.0;
        assert_ne!(bar, other);
    }
}
