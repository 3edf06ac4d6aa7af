//! Interactive session over a record index.
//!
//! Each input line is one command, parsed with clap in multicall mode so the
//! first word picks the subcommand:
//!
//! ```text
//! > insert AAPL 2024-01-02 187.15 185.64 188.44 183.89 82488700
//! > range AAPL 2024-01-01 2024-01-31
//! > buy AAPL 2024-01-02 10
//! > portfolio 2024-01-02
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::domain::error::TickerbookError;
use crate::domain::index::{InsertOutcome, RecordIndex};
use crate::domain::ingest::load_records;
use crate::domain::metrics;
use crate::domain::portfolio::Portfolio;
use crate::domain::record::{validate_date, StockRecord};
use crate::ports::export_port::ExportPort;
use crate::ports::record_source::RecordSource;

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Insert a new record (existing keys are left unchanged)
    Insert(RecordArgs),
    /// Look up one record
    Search(KeyArgs),
    /// Replace the values of an existing record
    Update(RecordArgs),
    /// Delete one record
    Remove(KeyArgs),
    /// Display every record
    All,
    /// Display records for one ticker
    Ticker { symbol: String },
    /// Display one ticker's records between two dates (inclusive)
    Range {
        symbol: String,
        #[arg(value_parser = parse_date)]
        start: String,
        #[arg(value_parser = parse_date)]
        end: String,
    },
    /// Display every ticker's records between two dates (inclusive)
    Dates {
        #[arg(value_parser = parse_date)]
        start: String,
        #[arg(value_parser = parse_date)]
        end: String,
    },
    /// Display records for several tickers, in the order given
    Multi {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Simple moving average of the first PERIOD closes
    Sma { symbol: String, period: usize },
    /// Exponential moving average seeded with the SMA
    Ema { symbol: String, period: usize },
    /// Standard deviation of closing prices
    Volatility { symbol: String },
    /// Buy shares at the day's close
    Buy(OrderArgs),
    /// Sell shares at the day's close
    Sell(OrderArgs),
    /// Show cash, holdings and total value on a date
    Portfolio {
        #[arg(value_parser = parse_date)]
        date: String,
    },
    /// Show every order attempt
    History,
    /// Load records from a CSV file
    Import { path: PathBuf },
    /// Write every record to a CSV file
    Export { path: PathBuf },
    /// Download records for a ticker from the configured data source
    Fetch { symbol: String },
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Args, Debug)]
struct KeyArgs {
    symbol: String,
    #[arg(value_parser = parse_date)]
    date: String,
}

#[derive(Args, Debug)]
struct RecordArgs {
    symbol: String,
    #[arg(value_parser = parse_date)]
    date: String,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    volume: i64,
}

impl From<RecordArgs> for StockRecord {
    fn from(args: RecordArgs) -> Self {
        StockRecord {
            symbol: args.symbol,
            date: args.date,
            open: args.open,
            close: args.close,
            high: args.high,
            low: args.low,
            volume: args.volume,
        }
    }
}

#[derive(Args, Debug)]
struct OrderArgs {
    symbol: String,
    #[arg(value_parser = parse_date)]
    date: String,
    quantity: i64,
}

fn parse_date(value: &str) -> Result<String, TickerbookError> {
    validate_date(value).map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// `Ticker: AAPL | Date: 2024-01-02` / `Open: $1.00 | Close: ...` pair of lines.
pub fn write_record(out: &mut dyn Write, record: &StockRecord) -> io::Result<()> {
    writeln!(out, "Ticker: {} | Date: {}", record.symbol, record.date)?;
    writeln!(
        out,
        "Open: ${:.2} | Close: ${:.2} | High: ${:.2} | Low: ${:.2} | Volume: {}",
        record.open, record.close, record.high, record.low, record.volume
    )
}

pub fn write_records(out: &mut dyn Write, records: &[StockRecord]) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "No records.");
    }
    for record in records {
        write_record(out, record)?;
    }
    Ok(())
}

/// One interactive session. The index is borrowed from the caller, which
/// keeps ownership of it after the session ends.
pub struct Session<'a> {
    index: &'a mut RecordIndex,
    portfolio: Portfolio,
    source: Option<&'a dyn RecordSource>,
}

impl<'a> Session<'a> {
    pub fn new(index: &'a mut RecordIndex, portfolio: Portfolio) -> Self {
        Self {
            index,
            portfolio,
            source: None,
        }
    }

    pub fn with_source(mut self, source: &'a dyn RecordSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Reads commands until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, mut input: R, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "===== tickerbook =====")?;
        writeln!(out, "Type `help` for the list of commands.")?;
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            match self.execute(&line, out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => writeln!(out, "error: {e}")?,
            }
        }
        writeln!(out, "Goodbye.")
    }

    pub fn execute(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow, TickerbookError> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let command = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write!(out, "{}", e.render())?;
                return Ok(Flow::Continue);
            }
        };
        tracing::debug!(?command, "shell command");
        self.dispatch(command, out)
    }

    fn dispatch(&mut self, command: ShellCommand, out: &mut dyn Write) -> Result<Flow, TickerbookError> {
        match command {
            ShellCommand::Insert(args) => {
                let record = StockRecord::from(args);
                let (symbol, date) = (record.symbol.clone(), record.date.clone());
                match self.index.insert(record) {
                    InsertOutcome::Inserted => writeln!(out, "Stock data inserted successfully.")?,
                    InsertOutcome::Duplicate => writeln!(
                        out,
                        "Record for {symbol} on {date} already exists; left unchanged."
                    )?,
                }
            }
            ShellCommand::Search(key) => match self.index.search(&key.symbol, &key.date) {
                Some(record) => {
                    writeln!(out, "Stock found:")?;
                    write_record(out, record)?;
                }
                None => writeln!(out, "Stock not found.")?,
            },
            ShellCommand::Update(args) => match self.index.update(args.into()) {
                Ok(()) => writeln!(out, "Stock data updated successfully.")?,
                Err(e) => writeln!(out, "Update failed: {e}")?,
            },
            ShellCommand::Remove(key) => match self.index.remove(&key.symbol, &key.date) {
                Ok(_) => writeln!(out, "Stock data removed successfully.")?,
                Err(e) => writeln!(out, "Removal failed: {e}")?,
            },
            ShellCommand::All => {
                writeln!(out, "All stocks:")?;
                write_records(out, &self.index.all_records())?;
            }
            ShellCommand::Ticker { symbol } => {
                writeln!(out, "Stocks for {symbol}:")?;
                write_records(out, &self.index.by_symbol(&symbol))?;
            }
            ShellCommand::Range { symbol, start, end } => {
                writeln!(out, "Stocks for {symbol} between {start} and {end}:")?;
                write_records(out, &self.index.by_date_range(&symbol, &start, &end))?;
            }
            ShellCommand::Dates { start, end } => {
                writeln!(out, "Stocks between {start} and {end}:")?;
                write_records(out, &self.index.by_dates(&start, &end))?;
            }
            ShellCommand::Multi { symbols } => {
                writeln!(out, "Stocks for {}:", symbols.join(", "))?;
                write_records(out, &self.index.by_symbols(&symbols))?;
            }
            ShellCommand::Sma { symbol, period } => {
                let records = self.index.by_symbol(&symbol);
                match metrics::sma(&records, period) {
                    Some(v) => writeln!(out, "SMA({period}) for {symbol}: {v:.2}")?,
                    None => not_enough_data(out, "SMA", &symbol, period, records.len())?,
                }
            }
            ShellCommand::Ema { symbol, period } => {
                let records = self.index.by_symbol(&symbol);
                match metrics::ema(&records, period) {
                    Some(v) => writeln!(out, "EMA({period}) for {symbol}: {v:.2}")?,
                    None => not_enough_data(out, "EMA", &symbol, period, records.len())?,
                }
            }
            ShellCommand::Volatility { symbol } => {
                match metrics::volatility(&self.index.by_symbol(&symbol)) {
                    Some(v) => writeln!(out, "Volatility for {symbol}: {v:.4}")?,
                    None => writeln!(out, "No records for {symbol}.")?,
                }
            }
            ShellCommand::Buy(order) => {
                match self
                    .portfolio
                    .buy(&order.symbol, &order.date, order.quantity, &*self.index)
                {
                    Ok(fill) => writeln!(out, "{fill}")?,
                    Err(e) => writeln!(out, "Buy failed for {}: {e}", order.symbol)?,
                }
            }
            ShellCommand::Sell(order) => {
                match self
                    .portfolio
                    .sell(&order.symbol, &order.date, order.quantity, &*self.index)
                {
                    Ok(fill) => writeln!(out, "{fill}")?,
                    Err(e) => writeln!(out, "Sell failed for {}: {e}", order.symbol)?,
                }
            }
            ShellCommand::Portfolio { date } => self.write_portfolio(out, &date)?,
            ShellCommand::History => {
                if self.portfolio.history().is_empty() {
                    writeln!(out, "No transactions.")?;
                }
                for line in self.portfolio.history() {
                    writeln!(out, "{line}")?;
                }
            }
            ShellCommand::Import { path } => {
                let records = CsvAdapter::new(path.clone()).read_all()?;
                let summary = load_records(self.index, records);
                writeln!(
                    out,
                    "Imported {} records from {} ({} duplicates skipped).",
                    summary.inserted,
                    path.display(),
                    summary.duplicates
                )?;
            }
            ShellCommand::Export { path } => {
                let written = CsvAdapter::new(path.clone()).export(&*self.index)?;
                writeln!(out, "Exported {} records to {}.", written, path.display())?;
            }
            ShellCommand::Fetch { symbol } => {
                let source = self.source.ok_or_else(|| TickerbookError::Fetch {
                    reason: "no data source configured (start the shell with --config)".into(),
                })?;
                let records = source.fetch_records(&symbol)?;
                if records.is_empty() {
                    writeln!(out, "No stock data found for {symbol}.")?;
                } else {
                    let summary = load_records(self.index, records);
                    writeln!(
                        out,
                        "Fetched {} records for {} ({} already present).",
                        summary.total(),
                        symbol,
                        summary.duplicates
                    )?;
                }
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn write_portfolio(&self, out: &mut dyn Write, date: &str) -> io::Result<()> {
        writeln!(out, "=== Portfolio Summary ===")?;
        writeln!(out, "Date: {date}")?;
        writeln!(out, "Cash Balance: ${:.2}", self.portfolio.cash())?;
        writeln!(out, "Holdings:")?;

        let valuations = self.portfolio.valuations(&*self.index, date);
        if valuations.is_empty() {
            writeln!(out, "No stock holdings")?;
        }
        for v in &valuations {
            match (v.price, v.value()) {
                (Some(price), Some(value)) => writeln!(
                    out,
                    "{}: {} shares @ ${:.2} = ${:.2}",
                    v.symbol, v.shares, price, value
                )?,
                _ => writeln!(
                    out,
                    "{}: {} shares (no price data for {})",
                    v.symbol, v.shares, date
                )?,
            }
        }
        writeln!(
            out,
            "Total Portfolio Value: ${:.2}",
            self.portfolio.value(&*self.index, date)
        )
    }
}

fn not_enough_data(
    out: &mut dyn Write,
    what: &str,
    symbol: &str,
    period: usize,
    have: usize,
) -> io::Result<()> {
    writeln!(
        out,
        "Not enough data for {what}({period}) of {symbol}: have {have} records."
    )
}
