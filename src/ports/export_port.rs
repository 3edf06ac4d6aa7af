//! Index export port trait.

use crate::domain::error::TickerbookError;
use crate::domain::index::RecordIndex;

/// Port for writing the whole index out in ascending key order. The
/// destination belongs to the implementor.
pub trait ExportPort {
    /// Returns the number of records written.
    fn export(&self, index: &RecordIndex) -> Result<usize, TickerbookError>;
}
