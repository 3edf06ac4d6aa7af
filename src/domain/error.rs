//! Domain error types.

/// Failure of a keyed index lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("no record for {symbol} on {date}")]
    NotFound { symbol: String, date: String },

    #[error("no records for {symbol}")]
    UnknownSymbol { symbol: String },
}

/// Rejected ledger order. Every variant leaves cash and holdings untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("quantity must be positive, got {quantity}")]
    InvalidQuantity { quantity: i64 },

    #[error("no price data for {symbol} on {date}")]
    NoPrice { symbol: String, date: String },

    #[error("insufficient funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("cannot hold more shares of {symbol}: hold {held}, requested {requested}")]
    ShareLimit {
        symbol: String,
        held: i64,
        requested: i64,
    },

    #[error("not enough shares of {symbol}: hold {held}, requested {requested}")]
    InsufficientShares {
        symbol: String,
        held: i64,
        requested: i64,
    },
}

/// Top-level error type for tickerbook.
#[derive(Debug, thiserror::Error)]
pub enum TickerbookError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("csv error in {file} at line {line}: {reason}")]
    Csv {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("fetch failed: {reason}")]
    Fetch { reason: String },

    #[error("invalid date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TickerbookError> for std::process::ExitCode {
    fn from(err: &TickerbookError) -> Self {
        let code: u8 = match err {
            TickerbookError::Io(_) => 1,
            TickerbookError::ConfigParse { .. }
            | TickerbookError::ConfigMissing { .. }
            | TickerbookError::ConfigInvalid { .. } => 2,
            TickerbookError::Csv { .. } | TickerbookError::Fetch { .. } => 3,
            TickerbookError::Index(_)
            | TickerbookError::Ledger(_)
            | TickerbookError::InvalidDate { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
