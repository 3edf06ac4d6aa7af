//! CLI and shell integration tests.
//!
//! Tests cover:
//! - Config resolution (data path, initial cash, legacy API key)
//! - Loading CSV files into an index, duplicates included
//! - `show` filter selection and `stats` output
//! - Merging fetched records into an existing CSV file
//! - Scripted shell sessions against a mock record source

mod common;

use common::*;
use std::io::Cursor;
use std::path::PathBuf;
use tickerbook::adapters::file_config_adapter::FileConfigAdapter;
use tickerbook::cli;
use tickerbook::domain::error::{IndexError, TickerbookError};
use tickerbook::domain::index::RecordIndex;
use tickerbook::domain::portfolio::Portfolio;
use tickerbook::ports::config_port::ConfigPort;
use tickerbook::shell::Session;

const FULL_INI: &str = r#"
[data]
path = prices/stocks.csv

[fetch]
api_key = token

[portfolio]
initial_cash = 2500
"#;

mod config_resolution {
    use super::*;

    #[test]
    fn data_flag_overrides_config() {
        let config = FileConfigAdapter::from_string(FULL_INI).unwrap();
        let flag = PathBuf::from("other.csv");
        assert_eq!(
            cli::resolve_data_path(Some(&flag), Some(&config)),
            Some(flag.clone())
        );
        assert_eq!(
            cli::resolve_data_path(None, Some(&config)),
            Some(PathBuf::from("prices/stocks.csv"))
        );
        assert_eq!(cli::resolve_data_path(None, None), None);
    }

    #[test]
    fn initial_cash_precedence() {
        let config = FileConfigAdapter::from_string(FULL_INI).unwrap();
        assert_eq!(cli::resolve_initial_cash(Some(50.0), Some(&config)).unwrap(), 50.0);
        assert_eq!(cli::resolve_initial_cash(None, Some(&config)).unwrap(), 2500.0);
        assert_eq!(
            cli::resolve_initial_cash(None, None).unwrap(),
            cli::DEFAULT_INITIAL_CASH
        );
    }

    #[test]
    fn negative_cash_is_rejected() {
        let err = cli::resolve_initial_cash(Some(-1.0), None).unwrap_err();
        assert!(matches!(err, TickerbookError::ConfigInvalid { .. }));
    }

    #[test]
    fn load_config_reads_file_from_disk() {
        let file = write_temp_file(FULL_INI);
        let config = cli::load_config(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.get_string("fetch", "api_key"), Some("token".into()));
    }

    #[test]
    fn load_config_missing_file_is_exit_code_2() {
        match cli::load_config(&PathBuf::from("/nonexistent/tickerbook.ini")) {
            Err(code) => assert_eq!(code, std::process::ExitCode::from(2)),
            Ok(_) => panic!("expected missing config to fail"),
        }
    }
}

mod loading {
    use super::*;

    #[test]
    fn load_index_counts_duplicates() {
        let file = write_temp_file(SAMPLE_CSV);
        let (index, summary) = cli::load_index(file.path()).unwrap();

        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(index.len(), 4);
        // First row for a key wins.
        assert_eq!(index.search("AAPL", "2024-01-02").unwrap().close, 185.64);
    }

    #[test]
    fn load_index_reports_bad_rows() {
        let file = write_temp_file("symbol,date,open,close,high,low,volume\nAAPL,2024-13-01,1,1,1,1,1\n");
        assert!(matches!(
            cli::load_index(file.path()),
            Err(TickerbookError::Csv { line: 2, .. })
        ));
    }
}

mod show_and_stats {
    use super::*;

    fn dates(records: &[StockRecord]) -> Vec<String> {
        records.iter().map(|r| format!("{} {}", r.symbol, r.date)).collect()
    }

    #[test]
    fn select_records_picks_query() {
        let index = sample_index();

        assert_eq!(cli::select_records(&index, None, None, None).len(), 6);
        assert_eq!(
            dates(&cli::select_records(&index, Some("MSFT"), None, None)),
            ["MSFT 2024-01-02", "MSFT 2024-01-03"]
        );
        assert_eq!(
            dates(&cli::select_records(&index, Some("AAPL"), Some("2024-01-03"), None)),
            ["AAPL 2024-01-03", "AAPL 2024-01-04"]
        );
        assert_eq!(
            dates(&cli::select_records(&index, None, None, Some("2024-01-02"))),
            ["AAPL 2024-01-02", "MSFT 2024-01-02", "TSLA 2024-01-02"]
        );
    }

    #[test]
    fn select_records_with_open_bounds() {
        let index = sample_index();
        assert_eq!(
            dates(&cli::select_records(&index, Some("AAPL"), None, Some("2024-01-03"))),
            ["AAPL 2024-01-02", "AAPL 2024-01-03"]
        );
        assert_eq!(
            dates(&cli::select_records(&index, None, Some("2024-01-03"), Some("2024-01-03"))),
            ["AAPL 2024-01-03", "MSFT 2024-01-03"]
        );
        assert!(cli::select_records(&index, Some("GOOG"), None, None).is_empty());
    }

    #[test]
    fn unknown_symbol_maps_to_exit_code_4() {
        let index = sample_index();
        assert_eq!(cli::symbol_records(&index, "MSFT").unwrap().len(), 2);

        let err = cli::symbol_records(&index, "GOOG").unwrap_err();
        assert!(matches!(
            err,
            TickerbookError::Index(IndexError::UnknownSymbol { .. })
        ));
        assert_eq!(std::process::ExitCode::from(&err), std::process::ExitCode::from(4));
    }

    #[test]
    fn stats_output() {
        let records: Vec<_> = [100.0, 110.0, 120.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| make_record("ACME", &format!("2024-02-0{}", i + 1), c))
            .collect();
        let mut out = Vec::new();
        cli::write_stats(&mut out, "ACME", &records, 2).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("ACME: 3 records, 2024-02-01 to 2024-02-03"));
        assert!(text.contains("SMA(2):      105.00"));
        assert!(text.contains("Return:       +20.00%"));
    }

    #[test]
    fn stats_with_short_history_prints_na() {
        let records = vec![make_record("ACME", "2024-02-01", 10.0)];
        let mut out = Vec::new();
        cli::write_stats(&mut out, "ACME", &records, 20).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("SMA(20):      n/a"));
        assert!(text.contains("EMA(20):      n/a"));
    }
}

mod merge {
    use super::*;

    #[test]
    fn merge_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("AAPL.csv");

        let (summary, written) = cli::merge_into_file(
            &path,
            vec![
                make_record("AAPL", "2025-01-03", 2.0),
                make_record("AAPL", "2025-01-02", 1.0),
            ],
        )
        .unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(written, 2);
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "symbol,date,open,close,high,low,volume");
        assert!(lines[1].starts_with("AAPL,2025-01-02,"));
        assert!(lines[2].starts_with("AAPL,2025-01-03,"));
    }

    #[test]
    fn merge_keeps_existing_rows() {
        let file = write_temp_file(SAMPLE_CSV);
        let (summary, written) = cli::merge_into_file(
            file.path(),
            vec![
                make_record("AAPL", "2024-01-02", 1.0),
                make_record("AAPL", "2024-01-05", 190.0),
            ],
        )
        .unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(written, 5);
        let (index, _) = cli::load_index(file.path()).unwrap();
        assert_eq!(index.search("AAPL", "2024-01-02").unwrap().close, 185.64);
    }
}

mod sessions {
    use super::*;

    fn run(index: &mut RecordIndex, source: &MockRecordSource, script: &str) -> String {
        let mut out = Vec::new();
        Session::new(index, Portfolio::new(10_000.0))
            .with_source(source)
            .run(Cursor::new(script.to_string()), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn full_session() {
        let source = MockRecordSource::new().with_records(
            "NVDA",
            vec![
                make_record("NVDA", "2024-01-02", 48.0),
                make_record("NVDA", "2024-01-03", 47.5),
            ],
        );
        let mut index = sample_index();

        let out = run(
            &mut index,
            &source,
            "all\n\
             fetch NVDA\n\
             multi NVDA MSFT\n\
             buy NVDA 2024-01-02 100\n\
             sell NVDA 2024-01-03 40\n\
             portfolio 2024-01-03\n\
             exit\n\
             all\n",
        );

        assert!(out.contains("All stocks:"));
        assert!(out.contains("Fetched 2 records for NVDA (0 already present)."));
        assert!(out.contains("Stocks for NVDA, MSFT:"));
        assert!(out.contains("Bought 100 shares of NVDA at $48.00 on 2024-01-02. Total cost: $4800.00"));
        assert!(out.contains("Sold 40 shares of NVDA at $47.50 on 2024-01-03. Total value: $1900.00"));
        assert!(out.contains("NVDA: 60 shares @ $47.50 = $2850.00"));
        assert!(out.contains("Total Portfolio Value: $9950.00"));
        // Nothing after `exit` runs.
        assert_eq!(out.matches("All stocks:").count(), 1);
        assert_eq!(index.len(), 8);
    }

    #[test]
    fn source_errors_do_not_end_session() {
        let source = MockRecordSource::new().with_error("AAPL", "status 429");
        let mut index = RecordIndex::new();

        let out = run(&mut index, &source, "fetch AAPL\nticker AAPL\n");

        assert!(out.contains("error: fetch failed: status 429"));
        assert!(out.contains("Stocks for AAPL:"));
        assert!(out.ends_with("Goodbye.\n"));
    }

    #[test]
    fn session_lends_index_back() {
        let source = MockRecordSource::new();
        let mut index = RecordIndex::new();
        run(
            &mut index,
            &source,
            "insert IBM 2024-01-02 160 161.5 162 159 4000000\nremove IBM 2024-01-02\ninsert IBM 2024-01-03 1 2 3 0.5 10\n",
        );
        assert_eq!(index.len(), 1);
        assert!(index.search("IBM", "2024-01-03").is_some());
    }
}
