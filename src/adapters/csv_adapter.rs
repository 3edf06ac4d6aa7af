//! CSV file import/export adapter.
//!
//! Layout: a header row `symbol,date,open,close,high,low,volume`, then one
//! row per record. Export writes rows in ascending key order.

use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::error::TickerbookError;
use crate::domain::index::RecordIndex;
use crate::domain::record::{validate_date, StockRecord};
use crate::ports::export_port::ExportPort;
use crate::ports::record_source::RecordSource;

pub const HEADER: [&str; 7] = ["symbol", "date", "open", "close", "high", "low", "volume"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads every row of the file. The first malformed row aborts the read.
    pub fn read_all(&self) -> Result<Vec<StockRecord>, TickerbookError> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| self.csv_error(0, e))?;
        self.check_header(rdr.headers().map_err(|e| self.csv_error(1, e))?)?;
        let mut records = Vec::new();

        for result in rdr.records() {
            let row = result.map_err(|e| {
                let line = e.position().map_or(0, |p| p.line());
                self.csv_error(line, e)
            })?;
            let line = row.position().map_or(0, |p| p.line());
            records.push(self.parse_row(&row, line)?);
        }

        tracing::info!(path = %self.path.display(), rows = records.len(), "csv read");
        Ok(records)
    }

    /// Writes `records` in the order given, replacing the file.
    pub fn write_all<'a, I>(&self, records: I) -> Result<usize, TickerbookError>
    where
        I: IntoIterator<Item = &'a StockRecord>,
    {
        let mut wtr = csv::Writer::from_path(&self.path).map_err(|e| self.csv_error(0, e))?;
        wtr.write_record(HEADER).map_err(|e| self.csv_error(1, e))?;

        let mut written = 0usize;
        for record in records {
            let row = [
                record.symbol.clone(),
                record.date.clone(),
                record.open.to_string(),
                record.close.to_string(),
                record.high.to_string(),
                record.low.to_string(),
                record.volume.to_string(),
            ];
            wtr.write_record(&row)
                .map_err(|e| self.csv_error(written as u64 + 2, e))?;
            written += 1;
        }
        wtr.flush()?;

        tracing::info!(path = %self.path.display(), rows = written, "csv written");
        Ok(written)
    }

    /// Columns are read by position, so the header must name them in `HEADER` order.
    fn check_header(&self, header: &csv::StringRecord) -> Result<(), TickerbookError> {
        let matches = header.len() == HEADER.len()
            && header.iter().zip(HEADER).all(|(got, want)| got.trim() == want);
        if matches {
            Ok(())
        } else {
            Err(self.row_error(1, format!("expected header {}", HEADER.join(","))))
        }
    }

    fn parse_row(&self, row: &csv::StringRecord, line: u64) -> Result<StockRecord, TickerbookError> {
        let symbol = self.field::<String>(row, 0, line)?;
        if symbol.is_empty() {
            return Err(self.row_error(line, "empty symbol".into()));
        }
        let date = self.field::<String>(row, 1, line)?;
        validate_date(&date).map_err(|e| self.row_error(line, e.to_string()))?;

        Ok(StockRecord {
            symbol,
            date,
            open: self.field(row, 2, line)?,
            close: self.field(row, 3, line)?,
            high: self.field(row, 4, line)?,
            low: self.field(row, 5, line)?,
            volume: self.field(row, 6, line)?,
        })
    }

    fn field<T>(&self, row: &csv::StringRecord, column: usize, line: u64) -> Result<T, TickerbookError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let name = HEADER[column];
        let raw = row
            .get(column)
            .ok_or_else(|| self.row_error(line, format!("missing {} column", name)))?;
        raw.trim()
            .parse()
            .map_err(|e| self.row_error(line, format!("invalid {} value {:?}: {}", name, raw, e)))
    }

    fn row_error(&self, line: u64, reason: String) -> TickerbookError {
        TickerbookError::Csv {
            file: self.path.display().to_string(),
            line,
            reason,
        }
    }

    fn csv_error(&self, line: u64, err: csv::Error) -> TickerbookError {
        self.row_error(line, err.to_string())
    }
}

impl RecordSource for CsvAdapter {
    fn fetch_records(&self, symbol: &str) -> Result<Vec<StockRecord>, TickerbookError> {
        let mut records = self.read_all()?;
        records.retain(|r| r.symbol == symbol);
        Ok(records)
    }
}

impl ExportPort for CsvAdapter {
    fn export(&self, index: &RecordIndex) -> Result<usize, TickerbookError> {
        self.write_all(index)
    }
}
