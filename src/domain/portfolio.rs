//! Cash and holdings ledger priced from the record index.
//!
//! Orders fill at the close of the requested day. The ledger only reads the
//! index; it never mutates it.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::LedgerError;
use crate::domain::index::RecordIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// An executed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub side: Side,
    pub symbol: String,
    pub date: String,
    pub quantity: i64,
    pub price: f64,
}

impl Fill {
    pub fn amount(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, total) = match self.side {
            Side::Buy => ("Bought", "Total cost"),
            Side::Sell => ("Sold", "Total value"),
        };
        write!(
            f,
            "{} {} shares of {} at ${:.2} on {}. {}: ${:.2}",
            verb,
            self.quantity,
            self.symbol,
            self.price,
            self.date,
            total,
            self.amount()
        )
    }
}

/// A holding priced on a given day. `price` is `None` when the index has no
/// record for that symbol and date.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub symbol: String,
    pub shares: i64,
    pub price: Option<f64>,
}

impl Valuation {
    pub fn value(&self) -> Option<f64> {
        self.price.map(|p| p * self.shares as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    cash: f64,
    holdings: BTreeMap<String, i64>,
    history: Vec<String>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            cash: initial_cash,
            holdings: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holdings(&self) -> &BTreeMap<String, i64> {
        &self.holdings
    }

    pub fn shares(&self, symbol: &str) -> i64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    /// Every order attempt, successful or not, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn buy(
        &mut self,
        symbol: &str,
        date: &str,
        quantity: i64,
        index: &RecordIndex,
    ) -> Result<Fill, LedgerError> {
        let result = self.try_buy(symbol, date, quantity, index);
        self.record(Side::Buy, symbol, &result);
        result
    }

    pub fn sell(
        &mut self,
        symbol: &str,
        date: &str,
        quantity: i64,
        index: &RecordIndex,
    ) -> Result<Fill, LedgerError> {
        let result = self.try_sell(symbol, date, quantity, index);
        self.record(Side::Sell, symbol, &result);
        result
    }

    /// Cash plus holdings priced at `date`. Holdings without a record on that
    /// day contribute nothing.
    pub fn value(&self, index: &RecordIndex, date: &str) -> f64 {
        self.cash
            + self
                .valuations(index, date)
                .iter()
                .filter_map(Valuation::value)
                .sum::<f64>()
    }

    pub fn valuations(&self, index: &RecordIndex, date: &str) -> Vec<Valuation> {
        self.holdings
            .iter()
            .map(|(symbol, &shares)| Valuation {
                symbol: symbol.clone(),
                shares,
                price: index.search(symbol, date).map(|r| r.close),
            })
            .collect()
    }

    fn try_buy(
        &mut self,
        symbol: &str,
        date: &str,
        quantity: i64,
        index: &RecordIndex,
    ) -> Result<Fill, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity { quantity });
        }
        let price = close_on(index, symbol, date)?;
        let cost = price * quantity as f64;
        if cost > self.cash {
            return Err(LedgerError::InsufficientFunds {
                needed: cost,
                available: self.cash,
            });
        }

        let held = self.shares(symbol);
        let total = held
            .checked_add(quantity)
            .ok_or_else(|| LedgerError::ShareLimit {
                symbol: symbol.to_string(),
                held,
                requested: quantity,
            })?;

        self.cash -= cost;
        self.holdings.insert(symbol.to_string(), total);
        Ok(Fill {
            side: Side::Buy,
            symbol: symbol.to_string(),
            date: date.to_string(),
            quantity,
            price,
        })
    }

    fn try_sell(
        &mut self,
        symbol: &str,
        date: &str,
        quantity: i64,
        index: &RecordIndex,
    ) -> Result<Fill, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity { quantity });
        }
        let held = self.shares(symbol);
        if held < quantity {
            return Err(LedgerError::InsufficientShares {
                symbol: symbol.to_string(),
                held,
                requested: quantity,
            });
        }
        let price = close_on(index, symbol, date)?;

        self.cash += price * quantity as f64;
        if held == quantity {
            self.holdings.remove(symbol);
        } else {
            self.holdings.insert(symbol.to_string(), held - quantity);
        }
        Ok(Fill {
            side: Side::Sell,
            symbol: symbol.to_string(),
            date: date.to_string(),
            quantity,
            price,
        })
    }

    fn record(&mut self, side: Side, symbol: &str, result: &Result<Fill, LedgerError>) {
        let line = match (side, result) {
            (_, Ok(fill)) => fill.to_string(),
            (Side::Buy, Err(e)) => format!("Buy failed for {}: {}", symbol, e),
            (Side::Sell, Err(e)) => format!("Sell failed for {}: {}", symbol, e),
        };
        tracing::debug!(%line, "ledger entry");
        self.history.push(line);
    }
}

fn close_on(index: &RecordIndex, symbol: &str, date: &str) -> Result<f64, LedgerError> {
    index
        .search(symbol, date)
        .map(|r| r.close)
        .ok_or_else(|| LedgerError::NoPrice {
            symbol: symbol.to_string(),
            date: date.to_string(),
        })
}
