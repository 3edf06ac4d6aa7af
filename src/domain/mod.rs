//! Core domain types and logic: the record index and the read-only
//! collaborators built on it.

pub mod record;
pub mod index;
pub mod ingest;
pub mod metrics;
pub mod portfolio;
pub mod error;
