//! Price statistics over a run of daily records.
//!
//! Inputs are expected in ascending date order, as `RecordIndex::by_symbol`
//! returns them. Every function that can be undefined for its input returns
//! `None` instead of a sentinel.

use crate::domain::record::StockRecord;

/// Mean close of the first `period` records.
pub fn sma(records: &[StockRecord], period: usize) -> Option<f64> {
    if period == 0 || records.len() < period {
        return None;
    }
    let sum: f64 = records[..period].iter().map(|r| r.close).sum();
    Some(sum / period as f64)
}

/// k = 2/(n+1), seeded with `sma(records, n)`, then
/// EMA = C[i]*k + EMA*(1-k) over the remaining records.
pub fn ema(records: &[StockRecord], period: usize) -> Option<f64> {
    let seed = sma(records, period)?;
    let k = 2.0 / (period as f64 + 1.0);
    Some(
        records[period..]
            .iter()
            .fold(seed, |ema, r| r.close * k + ema * (1.0 - k)),
    )
}

/// Population standard deviation of closes.
pub fn volatility(records: &[StockRecord]) -> Option<f64> {
    let mean = sma(records, records.len())?;
    let variance = records
        .iter()
        .map(|r| {
            let diff = r.close - mean;
            diff * diff
        })
        .sum::<f64>()
        / records.len() as f64;
    Some(variance.sqrt())
}

pub fn daily_price_change(open: f64, close: f64) -> f64 {
    close - open
}

/// (current - initial) / initial * 100
pub fn percentage_return(initial: f64, current: f64) -> Option<f64> {
    if initial == 0.0 {
        return None;
    }
    Some((current - initial) / initial * 100.0)
}

/// Return from the first record's close to the last record's close.
pub fn period_return(records: &[StockRecord]) -> Option<f64> {
    let first = records.first()?;
    let last = records.last()?;
    percentage_return(first.close, last.close)
}
