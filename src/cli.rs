//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::{IndexError, TickerbookError};
use crate::domain::index::RecordIndex;
use crate::domain::ingest::{load_records, LoadSummary};
use crate::domain::metrics;
use crate::domain::portfolio::Portfolio;
use crate::domain::record::{validate_date, StockRecord};
use crate::ports::config_port::ConfigPort;
use crate::shell::{write_records, Session};

pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;
pub const DEFAULT_PERIOD: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "tickerbook", about = "Stock price index and analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive session
    Shell {
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        cash: Option<f64>,
    },
    /// Print records from a CSV file
    Show {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, value_parser = parse_date)]
        start: Option<String>,
        #[arg(long, value_parser = parse_date)]
        end: Option<String>,
    },
    /// Print price statistics for one symbol
    Stats {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long, default_value_t = DEFAULT_PERIOD)]
        period: usize,
    },
    /// Download end-of-day prices and merge them into a CSV file
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_date(value: &str) -> Result<String, TickerbookError> {
    validate_date(value).map(str::to_string)
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Shell { data, config, cash } => run_shell(data.as_ref(), config.as_ref(), cash),
        Command::Show {
            data,
            symbol,
            start,
            end,
        } => run_show(&data, symbol.as_deref(), start.as_deref(), end.as_deref()),
        Command::Stats {
            data,
            symbol,
            period,
        } => run_stats(&data, &symbol, period),
        Command::Fetch {
            config,
            symbol,
            output,
        } => run_fetch(&config, &symbol, output.as_ref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TickerbookError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// `--data` wins over `[data] path`.
pub fn resolve_data_path(
    data_override: Option<&PathBuf>,
    config: Option<&dyn ConfigPort>,
) -> Option<PathBuf> {
    data_override.cloned().or_else(|| {
        config
            .and_then(|c| c.get_string("data", "path"))
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    })
}

/// `--cash` wins over `[portfolio] initial_cash`, which defaults to 10000.
pub fn resolve_initial_cash(
    cash_override: Option<f64>,
    config: Option<&dyn ConfigPort>,
) -> Result<f64, TickerbookError> {
    let cash = match (cash_override, config) {
        (Some(cash), _) => cash,
        (None, Some(c)) => c.get_double("portfolio", "initial_cash", DEFAULT_INITIAL_CASH),
        (None, None) => DEFAULT_INITIAL_CASH,
    };
    if !cash.is_finite() || cash < 0.0 {
        return Err(TickerbookError::ConfigInvalid {
            section: "portfolio".into(),
            key: "initial_cash".into(),
            reason: format!("must be a non-negative number, got {cash}"),
        });
    }
    Ok(cash)
}

/// Builds an index from a CSV file. Duplicate keys keep the first row.
pub fn load_index(path: &Path) -> Result<(RecordIndex, LoadSummary), TickerbookError> {
    let records = CsvAdapter::new(path.to_path_buf()).read_all()?;
    let mut index = RecordIndex::new();
    let summary = load_records(&mut index, records);
    Ok((index, summary))
}

/// Records matching the filters given to `show`, in key order. Each bound
/// is inclusive and applies only when given.
pub fn select_records(
    index: &RecordIndex,
    symbol: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Vec<StockRecord> {
    index
        .iter()
        .filter(|r| symbol.is_none_or(|s| r.symbol == s))
        .filter(|r| start.is_none_or(|s| r.date.as_str() >= s))
        .filter(|r| end.is_none_or(|e| r.date.as_str() <= e))
        .cloned()
        .collect()
}

/// Date-ordered records for `symbol`; an unknown symbol is an error.
pub fn symbol_records(index: &RecordIndex, symbol: &str) -> Result<Vec<StockRecord>, TickerbookError> {
    let records = index.by_symbol(symbol);
    if records.is_empty() {
        return Err(IndexError::UnknownSymbol {
            symbol: symbol.to_string(),
        }
        .into());
    }
    Ok(records)
}

pub fn write_stats(
    out: &mut dyn Write,
    symbol: &str,
    records: &[StockRecord],
    period: usize,
) -> io::Result<()> {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));

    match (records.first(), records.last()) {
        (Some(first), Some(last)) => writeln!(
            out,
            "{}: {} records, {} to {}",
            symbol,
            records.len(),
            first.date,
            last.date
        )?,
        _ => writeln!(out, "{symbol}: no records")?,
    }
    writeln!(out, "SMA({period}):      {}", fmt(metrics::sma(records, period)))?;
    writeln!(out, "EMA({period}):      {}", fmt(metrics::ema(records, period)))?;
    writeln!(
        out,
        "Volatility:   {}",
        metrics::volatility(records).map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
    )?;
    writeln!(
        out,
        "Return:       {}",
        metrics::period_return(records).map_or_else(|| "n/a".to_string(), |v| format!("{v:+.2}%"))
    )?;
    if let Some(last) = records.last() {
        writeln!(
            out,
            "Last change:  {:+.2} ({})",
            metrics::daily_price_change(last.open, last.close),
            last.date
        )?;
    }
    Ok(())
}

fn run_shell(
    data_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    cash: Option<f64>,
) -> ExitCode {
    let config = match config_path.map(load_config).transpose() {
        Ok(c) => c,
        Err(code) => return code,
    };
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);

    let initial_cash = match resolve_initial_cash(cash, config_port) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut index = RecordIndex::new();
    if let Some(path) = resolve_data_path(data_path, config_port) {
        if path.exists() {
            match load_index(&path) {
                Ok((loaded, summary)) => {
                    eprintln!(
                        "Loaded {} records from {} ({} duplicates skipped)",
                        summary.inserted,
                        path.display(),
                        summary.duplicates
                    );
                    index = loaded;
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            }
        } else {
            tracing::warn!(path = %path.display(), "data file not found, starting empty");
            eprintln!("{} not found, starting with an empty index", path.display());
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    #[cfg(feature = "fetch")]
    {
        use crate::adapters::stockdata_adapter::StockDataAdapter;

        let source = config_port.and_then(|c| match StockDataAdapter::from_config(c) {
            Ok(s) => Some(s),
            Err(e) => {
                eprintln!("warning: fetch disabled: {e}");
                None
            }
        });
        let mut session = Session::new(&mut index, Portfolio::new(initial_cash));
        if let Some(source) = source.as_ref() {
            session = session.with_source(source);
        }
        finish_session(session.run(stdin.lock(), &mut stdout))
    }

    #[cfg(not(feature = "fetch"))]
    {
        let mut session = Session::new(&mut index, Portfolio::new(initial_cash));
        finish_session(session.run(stdin.lock(), &mut stdout))
    }
}

fn finish_session(result: io::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err = TickerbookError::from(e);
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

fn run_show(data: &Path, symbol: Option<&str>, start: Option<&str>, end: Option<&str>) -> ExitCode {
    let (index, _) = match load_index(data) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let records = select_records(&index, symbol, start, end);
    let mut stdout = io::stdout().lock();
    if let Err(e) = write_records(&mut stdout, &records) {
        let err = TickerbookError::from(e);
        eprintln!("error: {err}");
        return (&err).into();
    }
    eprintln!("{} of {} records shown", records.len(), index.len());
    ExitCode::SUCCESS
}

fn run_stats(data: &Path, symbol: &str, period: usize) -> ExitCode {
    let (index, _) = match load_index(data) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let records = match symbol_records(&index, symbol) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e} in {}", data.display());
            return (&e).into();
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = write_stats(&mut stdout, symbol, &records, period) {
        let err = TickerbookError::from(e);
        eprintln!("error: {err}");
        return (&err).into();
    }
    ExitCode::SUCCESS
}

fn run_fetch(config_path: &PathBuf, symbol: &str, output: Option<&PathBuf>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "fetch")]
    {
        use crate::adapters::stockdata_adapter::StockDataAdapter;
        use crate::ports::record_source::RecordSource;

        let source = match StockDataAdapter::from_config(&config) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let output = output
            .cloned()
            .or_else(|| resolve_data_path(None, Some(&config as &dyn ConfigPort)))
            .unwrap_or_else(|| PathBuf::from(format!("{symbol}.csv")));

        eprintln!("Fetching {} from {}", symbol, source.date_from());
        let fetched = match source.fetch_records(symbol) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        if fetched.is_empty() {
            eprintln!("No stock data found for {symbol}");
            return ExitCode::SUCCESS;
        }

        match merge_into_file(&output, fetched) {
            Ok((summary, written)) => {
                eprintln!(
                    "Fetched {} records for {} ({} already present); wrote {} records to {}",
                    summary.total(),
                    symbol,
                    summary.duplicates,
                    written,
                    output.display()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "fetch"))]
    {
        let _ = (config, symbol, output);
        eprintln!("error: fetch feature is required for fetch");
        ExitCode::from(1)
    }
}

/// Loads `path` if it exists, adds `records` (existing keys win), and
/// rewrites the file in key order.
pub fn merge_into_file(
    path: &Path,
    records: Vec<StockRecord>,
) -> Result<(LoadSummary, usize), TickerbookError> {
    let mut index = if path.exists() {
        load_index(path)?.0
    } else {
        RecordIndex::new()
    };
    let summary = load_records(&mut index, records);
    let written = CsvAdapter::new(path.to_path_buf()).write_all(&index)?;
    Ok((summary, written))
}
