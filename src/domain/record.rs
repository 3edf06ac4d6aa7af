//! Daily stock record and its composite key.

use chrono::NaiveDate;

use crate::domain::error::TickerbookError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One trading day for one symbol. Dates are kept as `YYYY-MM-DD` strings so
/// lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub symbol: String,
    pub date: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
}

/// Ordering key of a record: symbol first, then date.
///
/// Compared as a pair rather than as the concatenated string, so `("A", "B1")`
/// and `("AB", "1")` are distinct and ordered by symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey<'a> {
    pub symbol: &'a str,
    pub date: &'a str,
}

impl<'a> RecordKey<'a> {
    pub fn new(symbol: &'a str, date: &'a str) -> Self {
        Self { symbol, date }
    }
}

impl StockRecord {
    pub fn new(
        symbol: impl Into<String>,
        date: impl Into<String>,
        open: f64,
        close: f64,
        high: f64,
        low: f64,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date: date.into(),
            open,
            close,
            high,
            low,
            volume,
        }
    }

    pub fn key(&self) -> RecordKey<'_> {
        RecordKey::new(&self.symbol, &self.date)
    }
}

/// Checks that `value` is a real calendar date in `YYYY-MM-DD` form and
/// returns it unchanged.
pub fn validate_date(value: &str) -> Result<&str, TickerbookError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|d| d.format(DATE_FORMAT).to_string() == value)
        .map(|_| value)
        .ok_or_else(|| TickerbookError::InvalidDate {
            value: value.to_string(),
        })
}
