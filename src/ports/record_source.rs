//! Record ingestion port trait.

use crate::domain::error::TickerbookError;
use crate::domain::record::StockRecord;

/// Anything that can produce daily records for a symbol: a CSV file, a
/// market-data HTTP API.
pub trait RecordSource {
    fn fetch_records(&self, symbol: &str) -> Result<Vec<StockRecord>, TickerbookError>;
}
