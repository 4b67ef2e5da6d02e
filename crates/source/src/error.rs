//! Source store error types.

/// Errors produced while talking to the source store.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("cannot change to directory {path}: {reason}")]
    Directory { path: String, reason: String },

    #[error("listing failed: {0}")]
    List(String),

    #[error("fetch of {name} failed: {reason}")]
    Fetch { name: String, reason: String },

    #[error("delete of {name} failed: {reason}")]
    Delete { name: String, reason: String },

    #[error("session closed")]
    Closed,
}
