//! End-of-day price fetcher for the stockdata.org HTTP API.
//!
//! `GET {base_url}?symbols=AAPL&api_token=...&date_from=2025-01-01` answers
//!
//! ```json
//! {"data": [{"date": "2025-01-02T00:00:00.000000Z", "open": 1.0, "high": 1.0,
//!            "low": 1.0, "close": 1.0, "volume": 100}]}
//! ```

use serde::Deserialize;

use crate::domain::error::TickerbookError;
use crate::domain::record::{validate_date, StockRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::record_source::RecordSource;

pub const DEFAULT_BASE_URL: &str = "https://api.stockdata.org/v1/data/eod";
pub const DEFAULT_DATE_FROM: &str = "2025-01-01";

#[derive(Debug, Deserialize)]
struct EodResponse {
    #[serde(default)]
    data: Vec<EodBar>,
}

#[derive(Debug, Deserialize)]
struct EodBar {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

#[derive(Debug, Clone)]
pub struct StockDataAdapter {
    base_url: String,
    api_key: String,
    date_from: String,
}

impl StockDataAdapter {
    pub fn new(base_url: String, api_key: String, date_from: String) -> Self {
        Self {
            base_url,
            api_key,
            date_from,
        }
    }

    /// `[fetch] api_key` (or a top-level `API_KEY`) is required; `base_url`
    /// and `date_from` fall back to defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TickerbookError> {
        let api_key = config
            .get_string_or_top_level("fetch", "api_key")
            .ok_or_else(|| TickerbookError::ConfigMissing {
                section: "fetch".into(),
                key: "api_key".into(),
            })?;
        let base_url = config
            .get_string("fetch", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let date_from = config
            .get_string("fetch", "date_from")
            .unwrap_or_else(|| DEFAULT_DATE_FROM.to_string());
        validate_date(&date_from).map_err(|_| TickerbookError::ConfigInvalid {
            section: "fetch".into(),
            key: "date_from".into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        })?;

        Ok(Self::new(base_url, api_key.trim().to_string(), date_from))
    }

    pub fn date_from(&self) -> &str {
        &self.date_from
    }
}

impl RecordSource for StockDataAdapter {
    fn fetch_records(&self, symbol: &str) -> Result<Vec<StockRecord>, TickerbookError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| TickerbookError::Fetch {
                reason: e.to_string(),
            })?;

        tracing::info!(symbol, base_url = %self.base_url, date_from = %self.date_from, "fetching end-of-day data");
        let response = client
            .get(&self.base_url)
            .query(&[
                ("symbols", symbol),
                ("api_token", self.api_key.as_str()),
                ("date_from", self.date_from.as_str()),
            ])
            .send()
            .map_err(|e| TickerbookError::Fetch {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TickerbookError::Fetch {
                reason: format!("{} returned status {}", self.base_url, status),
            });
        }

        let body = response.text().map_err(|e| TickerbookError::Fetch {
            reason: e.to_string(),
        })?;
        parse_response(symbol, &body)
    }
}

/// Converts an EOD response body into records for `symbol`. Timestamps are
/// cut at the `T` to leave the calendar date.
pub fn parse_response(symbol: &str, body: &str) -> Result<Vec<StockRecord>, TickerbookError> {
    let response: EodResponse = serde_json::from_str(body).map_err(|e| TickerbookError::Fetch {
        reason: format!("unexpected response: {}", e),
    })?;

    response
        .data
        .into_iter()
        .map(|bar| {
            let date = bar.date.split('T').next().unwrap_or_default().to_string();
            validate_date(&date)?;
            Ok(StockRecord {
                symbol: symbol.to_string(),
                date,
                open: bar.open,
                close: bar.close,
                high: bar.high,
                low: bar.low,
                volume: bar.volume,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const BODY: &str = r#"{
        "meta": {"date_from": "2025-01-01", "date_to": "2025-01-03"},
        "data": [
            {"date": "2025-01-03T00:00:00.000000Z", "open": 243.36, "high": 244.18,
             "low": 241.89, "close": 243.36, "volume": 40244114},
            {"date": "2025-01-02T00:00:00.000000Z", "open": 248.93, "high": 249.1,
             "low": 241.82, "close": 243.85, "volume": 55740731}
        ]
    }"#;

    #[test]
    fn parses_bars_and_truncates_timestamps() {
        let records = parse_response("AAPL", BODY).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "AAPL");
        assert_eq!(records[0].date, "2025-01-03");
        assert_eq!(records[1].date, "2025-01-02");
        assert_eq!(records[1].open, 248.93);
        assert_eq!(records[1].close, 243.85);
        assert_eq!(records[1].high, 249.1);
        assert_eq!(records[1].low, 241.82);
        assert_eq!(records[1].volume, 55740731);
    }

    #[test]
    fn empty_data_is_empty_vec() {
        assert!(parse_response("AAPL", r#"{"data": []}"#).unwrap().is_empty());
        assert!(parse_response("AAPL", r#"{"meta": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_fetch_error() {
        let err = parse_response("AAPL", "<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, TickerbookError::Fetch { .. }));
    }

    #[test]
    fn bad_date_in_body_is_rejected() {
        let body = r#"{"data": [{"date": "yesterday", "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1}]}"#;
        assert!(matches!(
            parse_response("AAPL", body),
            Err(TickerbookError::InvalidDate { .. })
        ));
    }

    #[test]
    fn from_config_uses_defaults() {
        let config = FileConfigAdapter::from_string("[fetch]\napi_key = token\n").unwrap();
        let adapter = StockDataAdapter::from_config(&config).unwrap();
        assert_eq!(adapter.base_url, DEFAULT_BASE_URL);
        assert_eq!(adapter.api_key, "token");
        assert_eq!(adapter.date_from(), DEFAULT_DATE_FROM);
    }

    #[test]
    fn from_config_accepts_legacy_key() {
        let config = FileConfigAdapter::from_string("API_KEY=abc123\n").unwrap();
        let adapter = StockDataAdapter::from_config(&config).unwrap();
        assert_eq!(adapter.api_key, "abc123");
    }

    #[test]
    fn from_config_requires_key() {
        let config = FileConfigAdapter::from_string("[fetch]\ndate_from = 2024-01-01\n").unwrap();
        assert!(matches!(
            StockDataAdapter::from_config(&config),
            Err(TickerbookError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn from_config_rejects_bad_date_from() {
        let config =
            FileConfigAdapter::from_string("[fetch]\napi_key = k\ndate_from = 01-01-2024\n")
                .unwrap();
        assert!(matches!(
            StockDataAdapter::from_config(&config),
            Err(TickerbookError::ConfigInvalid { .. })
        ));
    }
}
