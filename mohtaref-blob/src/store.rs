use async_trait::async_trait;

use crate::{BlobId, BlobResult, Bucket, ByteStream};

/// Core blob storage operations - must be implemented by all storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob from a stream under a caller-chosen id.
    ///
    /// A failed put must not leave a readable object behind.
    async fn put(
        &self,
        bucket: Bucket,
        id: &BlobId,
        filename: &str,
        content_type: &str,
        stream: ByteStream,
    ) -> BlobResult<PutResult>;

    /// Get a blob as a stream
    async fn get(&self, bucket: Bucket, id: &BlobId) -> BlobResult<GetResult>;

    /// Delete a blob. Unknown ids are `NotFound`.
    async fn delete(&self, bucket: Bucket, id: &BlobId) -> BlobResult<()>;

    /// Remove whatever an interrupted put left behind (partial chunks).
    async fn discard(&self, bucket: Bucket, id: &BlobId) -> BlobResult<()>;

    /// Re-establish the backend connection after a failure.
    async fn reconnect(&self) -> BlobResult<()> {
        Ok(())
    }

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
}

/// Result of a get operation
pub struct GetResult {
    pub stream: ByteStream,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}
