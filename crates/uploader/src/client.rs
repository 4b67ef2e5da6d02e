//! Upload client.
//!
//! Async HTTP client using `reqwest` with optional token authentication.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::request::UploadRequest;
use crate::tags::TagSet;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from the upload client.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("auth token is not a valid header value")]
    InvalidToken,
}

/// Settings fixed for the lifetime of an [`Uploader`].
#[derive(Clone)]
pub struct UploaderConfig {
    pub endpoint: Url,
    /// Sent as `Authorization: Token <value>` when non-empty.
    pub auth_token: Option<String>,
    pub tags: TagSet,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl UploaderConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            auth_token: None,
            tags: TagSet::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("auth_token", &self.token().map(|_| "<redacted>"))
            .field("tags", &self.tags)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Successful upload. The body is an opaque document identifier and may
/// be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: u16,
    pub document_id: String,
}

/// Uploads documents to the ingestion endpoint.
pub struct Uploader {
    http: reqwest::Client,
    endpoint: Url,
    tags: TagSet,
}

impl Uploader {
    /// Builds the client. Fails with [`UploadError::InvalidToken`] if the
    /// token cannot be sent as a header.
    pub fn new(config: UploaderConfig) -> Result<Self, UploadError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.token() {
            let mut value = HeaderValue::from_str(&format!("Token {token}"))
                .map_err(|_| UploadError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
            tags: config.tags,
        })
    }

    /// Uploads one document. Any non-2xx status is an error; nothing is
    /// retried here.
    pub async fn upload(
        &self,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<UploadReceipt, UploadError> {
        let size = content.len();
        let form = UploadRequest::new(filename, content, &self.tags).into_form()?;

        debug!(file = %filename, bytes = size, tags = self.tags.len(), "posting document");
        let resp = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(UploadReceipt {
            status: status.as_u16(),
            document_id: resp.text().await?,
        })
    }
}
