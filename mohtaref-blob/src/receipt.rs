use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{BlobId, Bucket};

/// Receipt returned after successfully storing a blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobReceipt {
    pub id: BlobId,
    pub bucket: Bucket,
    pub size_bytes: u64,
    pub content_type: String,
    pub filename: String,
    pub created_at: i64,
}

impl BlobReceipt {
    pub fn new(id: BlobId, bucket: Bucket, size_bytes: u64) -> Self {
        Self {
            id,
            bucket,
            size_bytes,
            content_type: String::new(),
            filename: String::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = filename.into();
        self
    }
}

/// A stored object read back in full.
#[derive(Debug, Clone)]
pub struct OpenedBlob {
    pub id: BlobId,
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: Option<String>,
}

impl OpenedBlob {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
