//! tickerbook: in-memory stock price index with an interactive shell.
//!
//! Hexagonal architecture: the AVL record index and its read-only
//! collaborators in [`domain`], port traits in [`ports`], CSV/INI/HTTP
//! implementations in [`adapters`], command surfaces in [`cli`] and [`shell`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod shell;
