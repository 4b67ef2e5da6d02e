//! Source store client for the drop directory.
//!
//! The relay talks to the source through the [`SourceConnector`] and
//! [`SourceSession`] traits so cycle logic stays independent of the
//! transport. [`FtpConnector`] is the production implementation.

pub mod error;
pub mod ftp;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod session;
pub mod types;

pub use error::SourceError;
pub use ftp::{DEFAULT_FTP_PORT, FtpConnector, FtpSession, FtpSettings};
pub use session::{SourceConnector, SourceFuture, SourceSession};
pub use types::{FileContent, SourceEntry};
