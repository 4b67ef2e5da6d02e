//! Connector and session traits.
//!
//! A connector opens authenticated sessions; a session is one live
//! connection to the store. Callers must [`close`](SourceSession::close)
//! every session they open. Implementations also release the connection
//! on drop so an abandoned session never leaks it.

use std::future::Future;
use std::pin::Pin;

use crate::error::SourceError;
use crate::types::{FileContent, SourceEntry};

/// Boxed future returned by source operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Opens sessions against a source store.
pub trait SourceConnector: Send + Sync {
    /// Connects and authenticates. Fails with [`SourceError::Connection`].
    fn connect(&self) -> SourceFuture<'_, Box<dyn SourceSession>>;
}

/// One open connection to the source store.
///
/// No operation retries internally.
pub trait SourceSession: Send {
    /// Changes the working directory. Fails with [`SourceError::Directory`].
    fn change_directory<'a>(&'a mut self, path: &'a str) -> SourceFuture<'a, ()>;

    /// Returns a snapshot of the entries in the working directory.
    fn list_entries(&mut self) -> SourceFuture<'_, Vec<SourceEntry>>;

    /// Downloads the full content of one entry.
    fn fetch_content<'a>(&'a mut self, entry: &'a SourceEntry) -> SourceFuture<'a, FileContent>;

    /// Removes one entry from the store.
    fn delete_entry<'a>(&'a mut self, entry: &'a SourceEntry) -> SourceFuture<'a, ()>;

    /// Releases the connection.
    fn close(self: Box<Self>) -> SourceFuture<'static, ()>;
}
