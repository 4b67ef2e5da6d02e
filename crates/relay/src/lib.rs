//! Transfer pipeline between the drop directory and the ingestion endpoint.
//!
//! # Cycle
//!
//! 1. **Connect**: open and authenticate a source session
//! 2. **Enter**: change to the watched directory
//! 3. **List**: snapshot the pending entries
//! 4. **Transfer**: per entry: fetch, upload, delete on success
//! 5. **Close**: release the session on every path
//!
//! [`PollLoop`] repeats the cycle with a fixed sleep in between until its
//! cancellation token fires.

pub mod error;
pub mod orchestrator;
pub mod poll;
pub mod sink;
pub mod types;

pub use error::CycleError;
pub use orchestrator::TransferOrchestrator;
pub use poll::PollLoop;
pub use sink::{DocumentSink, SinkFuture};
pub use types::{CycleReport, EntryOutcome, EntryReport};
