//! Percentage analytics shown alongside a recommendation.

use crate::domain::error::MetricError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcaMetrics {
    /// price / ATH * 100
    pub price_over_ath_pct: f64,
    /// (ATH - price) / ATH * 100
    pub current_drawdown_pct: f64,
    /// (ATH - low since ATH) / ATH * 100
    pub max_drawdown_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitMetrics {
    /// (price - purchase price) / purchase price * 100
    pub profit_pct: f64,
}

pub fn compute_dca_metrics(
    price: f64,
    ath_now: f64,
    low_since_ath: f64,
) -> Result<DcaMetrics, MetricError> {
    if ath_now == 0.0 {
        return Err(MetricError::DivisionUndefined {
            metric: "drawdown",
        });
    }

    Ok(DcaMetrics {
        price_over_ath_pct: price / ath_now * 100.0,
        current_drawdown_pct: (ath_now - price) / ath_now * 100.0,
        max_drawdown_pct: (ath_now - low_since_ath) / ath_now * 100.0,
    })
}

pub fn compute_profit_metrics(price: f64, purchase_price: f64) -> Result<ProfitMetrics, MetricError> {
    if purchase_price == 0.0 {
        return Err(MetricError::DivisionUndefined {
            metric: "profit",
        });
    }

    Ok(ProfitMetrics {
        profit_pct: (price - purchase_price) / purchase_price * 100.0,
    })
}
