//! Port traits (hexagonal architecture boundaries).

pub mod config_port;
pub mod export_port;
pub mod record_source;
