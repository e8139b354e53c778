//! CSV file market data adapter.
//!
//! Serves bars from `{symbol}_{interval}.csv` files under a base directory.
//! Expected header: `timestamp,open,high,low,close,volume` with timestamps
//! formatted `%Y-%m-%d %H:%M:%S`.

use crate::domain::error::TradefuseError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

pub struct CsvMarketData {
    base_path: PathBuf,
}

impl CsvMarketData {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }
}

fn data_err(reason: String) -> TradefuseError {
    TradefuseError::MarketData { reason }
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, TradefuseError> {
    record
        .get(index)
        .ok_or_else(|| data_err(format!("missing {} column", name)))?
        .parse()
        .map_err(|e| data_err(format!("invalid {} value: {}", name, e)))
}

impl MarketDataPort for CsvMarketData {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TradefuseError> {
        let path = self.csv_path(symbol, interval);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_err(format!("CSV parse error: {}", e)))?;

            let timestamp_str = record
                .get(0)
                .ok_or_else(|| data_err("missing timestamp column".into()))?;
            let timestamp = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| data_err(format!("invalid timestamp format: {}", e)))?;

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                timestamp,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        if limit > 0 && bars.len() > limit {
            bars.drain(..bars.len() - limit);
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, rows: &[&str]) {
        let mut file = fs::File::create(dir.path().join(name)).unwrap();
        writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
    }

    #[test]
    fn fetch_returns_bars_ascending() {
        let dir = TempDir::new().unwrap();
        // deliberately out of order on disk
        write_csv(
            &dir,
            "BTC_1h.csv",
            &[
                "2024-01-01 02:00:00,102,103,101,102.5,900",
                "2024-01-01 00:00:00,100,101,99,100.5,1000",
                "2024-01-01 01:00:00,101,102,100,101.5,1100",
            ],
        );

        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        let bars = adapter.fetch_ohlcv("BTC", "1h", 0).unwrap();
        assert_eq!(bars.len(), 3);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[0].symbol, "BTC");
    }

    #[test]
    fn fetch_honors_limit_with_trailing_rows() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "BTC_1h.csv",
            &[
                "2024-01-01 00:00:00,100,101,99,100.5,1000",
                "2024-01-01 01:00:00,101,102,100,101.5,1100",
                "2024-01-01 02:00:00,102,103,101,102.5,900",
            ],
        );

        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        let bars = adapter.fetch_ohlcv("BTC", "1h", 2).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 101.5);
        assert_eq!(bars[1].close, 102.5);
    }

    #[test]
    fn missing_file_is_market_data_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_ohlcv("ETH", "1h", 0),
            Err(TradefuseError::MarketData { .. })
        ));
    }

    #[test]
    fn malformed_row_is_market_data_error() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "BTC_1h.csv", &["2024-01-01 00:00:00,abc,101,99,100,1000"]);
        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_ohlcv("BTC", "1h", 0),
            Err(TradefuseError::MarketData { .. })
        ));
    }

    #[test]
    fn bad_timestamp_is_market_data_error() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "BTC_1h.csv", &["01/01/2024,100,101,99,100,1000"]);
        let adapter = CsvMarketData::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_ohlcv("BTC", "1h", 0),
            Err(TradefuseError::MarketData { .. })
        ));
    }
}
