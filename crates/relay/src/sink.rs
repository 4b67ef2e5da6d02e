//! Upload side of a transfer.
//!
//! The orchestrator hands content to a `DocumentSink` rather than to the
//! HTTP client directly, which keeps cycle logic testable with mocks.

use std::future::Future;
use std::pin::Pin;

use docdrop_source::FileContent;
use docdrop_uploader::{UploadError, UploadReceipt, Uploader};

/// Boxed future returned by [`DocumentSink::send`].
pub type SinkFuture<'a> =
    Pin<Box<dyn Future<Output = Result<UploadReceipt, UploadError>> + Send + 'a>>;

/// Destination for fetched documents.
pub trait DocumentSink: Send + Sync {
    /// Uploads one document under `filename`. Only a returned receipt
    /// allows the entry to be deleted.
    fn send<'a>(&'a self, filename: &'a str, content: FileContent) -> SinkFuture<'a>;
}

impl DocumentSink for Uploader {
    fn send<'a>(&'a self, filename: &'a str, content: FileContent) -> SinkFuture<'a> {
        Box::pin(async move { self.upload(filename, content.into_bytes()).await })
    }
}
