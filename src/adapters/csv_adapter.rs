//! CSV price-history market data adapter.
//!
//! Reads `<base_path>/<TICKER>.csv` with a `date,open,high,low,close,volume`
//! header and derives the snapshot from the full history.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::error::BitageError;
use crate::domain::ohlcv::DailyBar;
use crate::domain::plan_validation::DATE_FORMAT;
use crate::domain::snapshot::PriceSnapshot;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;

pub struct CsvMarketDataAdapter {
    base_path: PathBuf,
}

impl CsvMarketDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BitageError> {
        let dir = config
            .get_string("market_data", "csv_dir")
            .ok_or_else(|| BitageError::ConfigMissing {
                section: "market_data".into(),
                key: "csv_dir".into(),
            })?;
        Ok(Self::new(PathBuf::from(dir)))
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// All bars for `ticker`, or `None` if there is no file for it.
    pub fn load_bars(&self, ticker: &str) -> Result<Option<Vec<DailyBar>>, BitageError> {
        let path = self.csv_path(ticker);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(ticker, path = %path.display(), "no price history file");
                return Ok(None);
            }
            Err(e) => {
                return Err(data_err(
                    ticker,
                    format!("failed to read {}: {}", path.display(), e),
                ));
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_err(ticker, format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| data_err(ticker, "missing date column".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
                .map_err(|e| data_err(ticker, format!("invalid date format: {}", e)))?;

            bars.push(DailyBar {
                ticker: ticker.to_string(),
                date,
                open: numeric_column(&record, 1, "open", ticker)?,
                high: numeric_column(&record, 2, "high", ticker)?,
                low: numeric_column(&record, 3, "low", ticker)?,
                close: numeric_column(&record, 4, "close", ticker)?,
                volume: numeric_column(&record, 5, "volume", ticker)?,
            });
        }

        debug!(ticker, bars = bars.len(), "loaded price history");
        Ok(Some(bars))
    }
}

fn data_err(ticker: &str, reason: String) -> BitageError {
    BitageError::MarketData {
        ticker: ticker.to_string(),
        reason,
    }
}

fn numeric_column(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    ticker: &str,
) -> Result<f64, BitageError> {
    record
        .get(index)
        .ok_or_else(|| data_err(ticker, format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| data_err(ticker, format!("invalid {} value: {}", name, e)))
}

impl MarketDataPort for CsvMarketDataAdapter {
    fn fetch_snapshot(&self, ticker: &str) -> Result<Option<PriceSnapshot>, BitageError> {
        Ok(self
            .load_bars(ticker)?
            .and_then(|bars| PriceSnapshot::from_bars(&bars)))
    }
}
