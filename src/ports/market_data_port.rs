//! Market data port trait.

use crate::domain::error::BitageError;
use crate::domain::snapshot::PriceSnapshot;

pub trait MarketDataPort {
    /// Current snapshot for `ticker`.
    ///
    /// `Ok(None)` means the provider has no data for the ticker. Callers
    /// present both `Ok(None)` and `Err` as a total absence of data.
    fn fetch_snapshot(&self, ticker: &str) -> Result<Option<PriceSnapshot>, BitageError>;
}
