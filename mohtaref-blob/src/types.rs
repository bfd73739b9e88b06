use bytes::Bytes;
use futures::Stream;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::{BlobError, BlobResult};

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Wrap an in-memory payload as a single-chunk stream.
pub fn bytes_stream(data: impl Into<Bytes>) -> ByteStream {
    let data = data.into();
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// The two logical buckets of the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Images,
    Videos,
}

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"];

const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
];

impl Bucket {
    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Images => "images",
            Bucket::Videos => "videos",
        }
    }

    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            Bucket::Images => IMAGE_TYPES,
            Bucket::Videos => VIDEO_TYPES,
        }
    }

    /// Allow-list check. Parameters such as `; charset=...` are ignored.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_content_types().contains(&essence.as_str())
    }

    /// Message used when the allow-list rejects a payload.
    pub fn rejection_message(&self) -> &'static str {
        match self {
            Bucket::Images => "Invalid file type. Only images are allowed.",
            Bucket::Videos => "Invalid file type. Only videos are allowed.",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a stored object: a 24-hex ObjectId string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(String);

impl BlobId {
    /// Generate a new identifier
    pub fn new() -> Self {
        Self(ObjectId::new().to_hex())
    }

    /// Parse a caller-supplied identifier. Anything that is not an
    /// ObjectId cannot name a stored object, so it is reported as missing.
    pub fn parse(raw: &str) -> BlobResult<Self> {
        ObjectId::parse_str(raw)
            .map(|oid| Self(oid.to_hex()))
            .map_err(|_| BlobError::not_found(raw))
    }

    pub fn object_id(&self) -> BlobResult<ObjectId> {
        ObjectId::parse_str(&self.0).map_err(|_| BlobError::not_found(self.0.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request to store a blob
#[derive(Debug, Clone, Default)]
pub struct BlobPut {
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub size_hint: Option<u64>,
}

impl BlobPut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_ignores_case_and_parameters() {
        assert!(Bucket::Images.accepts("IMAGE/PNG"));
        assert!(Bucket::Images.accepts("image/jpeg; q=0.9"));
        assert!(!Bucket::Images.accepts("image/bmp"));
        assert!(!Bucket::Images.accepts("video/mp4"));
        assert!(Bucket::Videos.accepts("video/x-matroska"));
    }

    #[test]
    fn malformed_ids_are_not_found() {
        let err = BlobId::parse("not-an-id").unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));

        let id = BlobId::new();
        assert_eq!(id.as_str().len(), 24);
        assert_eq!(BlobId::parse(id.as_str()).unwrap(), id);
    }
}
