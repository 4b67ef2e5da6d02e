//! Multipart request assembly.

use reqwest::multipart::{Form, Part};

use crate::client::UploadError;
use crate::tags::TagSet;

pub const DOCUMENT_FIELD: &str = "document";
pub const TAGS_FIELD: &str = "tags";
pub const DOCUMENT_CONTENT_TYPE: &str = "application/octet-stream";

/// Payload of one upload call, before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub filename: String,
    pub content: Vec<u8>,
    pub tags: Vec<String>,
}

impl UploadRequest {
    pub fn new(filename: impl Into<String>, content: Vec<u8>, tags: &TagSet) -> Self {
        Self {
            filename: filename.into(),
            content,
            tags: tags.as_slice().to_vec(),
        }
    }

    /// Encodes the request as a multipart form: the `document` part first,
    /// then one `tags` part per tag in order.
    pub fn into_form(self) -> Result<Form, UploadError> {
        let document = Part::bytes(self.content)
            .file_name(self.filename)
            .mime_str(DOCUMENT_CONTENT_TYPE)?;

        let form = self
            .tags
            .into_iter()
            .fold(Form::new().part(DOCUMENT_FIELD, document), |form, tag| {
                form.text(TAGS_FIELD, tag)
            });

        Ok(form)
    }
}
