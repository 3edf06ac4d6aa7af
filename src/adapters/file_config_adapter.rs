//! INI file configuration adapter.
//!
//! Recognised layout:
//!
//! ```ini
//! API_KEY=...            ; legacy top-level key, same as [fetch] api_key
//!
//! [data]
//! path = stocks.csv
//!
//! [fetch]
//! api_key = ...
//! base_url = https://api.stockdata.org/v1/data/eod
//! date_from = 2025-01-01
//!
//! [portfolio]
//! initial_cash = 10000
//! ```

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}
