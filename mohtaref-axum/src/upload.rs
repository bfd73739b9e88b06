use axum::extract::multipart::{Multipart, MultipartRejection};
use bytes::{Bytes, BytesMut};
use mohtaref_core::errors::SiteError;
use serde_json::json;

use crate::SiteAxumError;

/// A file part read from a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn bad_multipart(message: impl Into<String>, detail: String) -> SiteAxumError {
    SiteError::bad_request(message)
        .with_errors(json!({ "_multipart": [detail] }))
        .into()
}

/// Read the named file field, skipping any other parts.
///
/// A body that is not multipart, or that has no such field, is a
/// `BadRequest` ("No file provided").
pub async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
    name: &str,
) -> Result<UploadedFile, SiteAxumError> {
    let mut multipart = multipart
        .map_err(|rejection| bad_multipart("Expected a multipart/form-data body", rejection.body_text()))?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_multipart("Failed to parse multipart data", e.body_text()))?
    {
        if field.name() != Some(name) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let mut buf = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| bad_multipart("Failed to read uploaded file", e.body_text()))?
        {
            buf.extend_from_slice(&chunk);
        }

        tracing::debug!(field = name, size = buf.len(), "read multipart file field");

        return Ok(UploadedFile {
            field: name.to_string(),
            filename,
            content_type,
            bytes: buf.freeze(),
        });
    }

    Err(SiteError::bad_request("No file provided").into())
}
