use std::collections::HashMap;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use parking_lot::RwLock;

use crate::store::{GetResult, PutResult};
use crate::{bytes_stream, BlobError, BlobId, BlobResult, BlobStore, Bucket, ByteStream};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    filename: String,
    content_type: String,
}

type Key = (Bucket, String);

/// In-process object store used by tests and local runs.
///
/// Chunks land in a staging area while a put is in flight and only become
/// readable once the stream completes, mirroring GridFS files/chunks.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<Key, StoredObject>>,
    staging: RwLock<HashMap<Key, BytesMut>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of readable objects in a bucket.
    pub fn len(&self, bucket: Bucket) -> usize {
        self.objects.read().keys().filter(|(b, _)| *b == bucket).count()
    }

    pub fn is_empty(&self, bucket: Bucket) -> bool {
        self.len(bucket) == 0
    }

    /// Number of puts whose chunks were written but never completed.
    pub fn staged(&self) -> usize {
        self.staging.read().len()
    }

    pub fn contains(&self, bucket: Bucket, id: &str) -> bool {
        self.objects.read().contains_key(&(bucket, id.to_string()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: Bucket,
        id: &BlobId,
        filename: &str,
        content_type: &str,
        mut stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let key = (bucket, id.as_str().to_string());
        self.staging.write().insert(key.clone(), BytesMut::new());

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(buf) = self.staging.write().get_mut(&key) {
                buf.extend_from_slice(&chunk);
            }
        }

        let data = self
            .staging
            .write()
            .remove(&key)
            .map(BytesMut::freeze)
            .unwrap_or_default();
        let size_bytes = data.len() as u64;

        self.objects.write().insert(
            key,
            StoredObject {
                data,
                filename: filename.to_string(),
                content_type: content_type.to_string(),
            },
        );

        Ok(PutResult { size_bytes })
    }

    async fn get(&self, bucket: Bucket, id: &BlobId) -> BlobResult<GetResult> {
        let obj = self
            .objects
            .read()
            .get(&(bucket, id.as_str().to_string()))
            .cloned()
            .ok_or_else(|| BlobError::not_found(id.as_str()))?;

        Ok(GetResult {
            size_bytes: obj.data.len() as u64,
            stream: bytes_stream(obj.data),
            content_type: Some(obj.content_type),
            filename: Some(obj.filename),
        })
    }

    async fn delete(&self, bucket: Bucket, id: &BlobId) -> BlobResult<()> {
        self.objects
            .write()
            .remove(&(bucket, id.as_str().to_string()))
            .map(|_| ())
            .ok_or_else(|| BlobError::not_found(id.as_str()))
    }

    async fn discard(&self, bucket: Bucket, id: &BlobId) -> BlobResult<()> {
        let key = (bucket, id.as_str().to_string());
        self.staging.write().remove(&key);
        self.objects.write().remove(&key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
