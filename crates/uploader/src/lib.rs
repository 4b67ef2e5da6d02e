//! Document upload client.
//!
//! Sends one file per request to the ingestion endpoint as
//! `multipart/form-data`: a single `document` part plus one `tags` part per
//! configured tag, with an optional `Authorization: Token <token>` header.

pub mod client;
pub mod request;
pub mod tags;

pub use client::{UploadError, UploadReceipt, Uploader, UploaderConfig};
pub use request::UploadRequest;
pub use tags::TagSet;

pub use reqwest::Url;
