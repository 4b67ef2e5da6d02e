//! Cycle-level error types.

use docdrop_source::SourceError;

/// Failures that abort a whole cycle. Per-entry failures never surface
/// here; they are recorded as [`EntryOutcome`](crate::EntryOutcome)s.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("cannot connect to source: {0}")]
    Connect(SourceError),

    #[error("cannot enter source directory: {0}")]
    Directory(SourceError),

    #[error("cannot list source directory: {0}")]
    List(SourceError),
}

impl CycleError {
    /// Short name of the stage that failed, for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Connect(_) => "connect",
            CycleError::Directory(_) => "directory",
            CycleError::List(_) => "list",
        }
    }
}
