#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;

use tickerbook::domain::error::TickerbookError;
use tickerbook::domain::index::RecordIndex;
pub use tickerbook::domain::record::StockRecord;
use tickerbook::ports::record_source::RecordSource;

pub struct MockRecordSource {
    pub data: HashMap<String, Vec<StockRecord>>,
    pub errors: HashMap<String, String>,
}

impl MockRecordSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_records(mut self, symbol: &str, records: Vec<StockRecord>) -> Self {
        self.data.insert(symbol.to_string(), records);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl RecordSource for MockRecordSource {
    fn fetch_records(&self, symbol: &str) -> Result<Vec<StockRecord>, TickerbookError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TickerbookError::Fetch {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

/// Record whose prices are all `close`.
pub fn make_record(symbol: &str, date: &str, close: f64) -> StockRecord {
    StockRecord::new(symbol, date, close, close, close, close, 1_000)
}

pub fn sample_index() -> RecordIndex {
    [
        StockRecord::new("AAPL", "2024-01-02", 187.15, 185.64, 188.44, 183.89, 82_488_700),
        StockRecord::new("AAPL", "2024-01-03", 184.22, 184.25, 185.88, 183.43, 58_414_500),
        StockRecord::new("AAPL", "2024-01-04", 182.15, 181.91, 183.09, 180.88, 71_983_600),
        StockRecord::new("MSFT", "2024-01-02", 373.86, 370.87, 375.90, 366.77, 25_258_600),
        StockRecord::new("MSFT", "2024-01-03", 369.01, 370.60, 373.26, 368.51, 23_083_500),
        StockRecord::new("TSLA", "2024-01-02", 250.08, 248.42, 251.25, 244.41, 104_654_200),
    ]
    .into_iter()
    .collect()
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const SAMPLE_CSV: &str = "symbol,date,open,close,high,low,volume\n\
MSFT,2024-01-02,373.86,370.87,375.9,366.77,25258600\n\
AAPL,2024-01-03,184.22,184.25,185.88,183.43,58414500\n\
AAPL,2024-01-02,187.15,185.64,188.44,183.89,82488700\n\
AAPL,2024-01-02,1,1,1,1,1\n\
AAPL,2024-01-04,182.15,181.91,183.09,180.88,71983600\n";
