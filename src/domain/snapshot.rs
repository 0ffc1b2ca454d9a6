//! Price snapshot: current price, all-time high, its date, and the low since.

use chrono::NaiveDate;

use crate::domain::ohlcv::DailyBar;

/// All four fields are present together; absence of data is `Option::None`
/// at the call site, never a partially filled snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSnapshot {
    pub price: f64,
    pub ath_now: f64,
    pub ath_date: NaiveDate,
    pub low_since_ath: f64,
}

impl PriceSnapshot {
    /// Derive a snapshot from daily history.
    ///
    /// Price is the last close; the ATH is the highest high (earliest bar on
    /// ties); the low is the lowest low from the ATH bar onward, inclusive.
    /// Returns `None` for empty history.
    pub fn from_bars(bars: &[DailyBar]) -> Option<Self> {
        let mut sorted: Vec<&DailyBar> = bars.iter().collect();
        sorted.sort_by_key(|b| b.date);

        let last = sorted.last()?;

        let mut ath_index = 0usize;
        for (i, bar) in sorted.iter().enumerate() {
            if bar.high > sorted[ath_index].high {
                ath_index = i;
            }
        }

        let low_since_ath = sorted[ath_index..]
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min);

        Some(Self {
            price: last.close,
            ath_now: sorted[ath_index].high,
            ath_date: sorted[ath_index].date,
            low_since_ath,
        })
    }
}
