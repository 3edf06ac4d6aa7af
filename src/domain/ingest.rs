//! Bulk loading of records into the index.

use crate::domain::index::{InsertOutcome, RecordIndex};
use crate::domain::record::StockRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates
    }
}

/// Inserts every record and tallies how many were new. Existing keys keep
/// their stored record.
pub fn load_records<I>(index: &mut RecordIndex, records: I) -> LoadSummary
where
    I: IntoIterator<Item = StockRecord>,
{
    let mut summary = LoadSummary::default();
    for record in records {
        match index.insert(record) {
            InsertOutcome::Inserted => summary.inserted += 1,
            InsertOutcome::Duplicate => summary.duplicates += 1,
        }
    }
    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "records loaded"
    );
    summary
}
