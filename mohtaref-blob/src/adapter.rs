use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use futures::StreamExt;

use crate::{
    BlobConfig, BlobError, BlobId, BlobPut, BlobReceipt, BlobResult, BlobStore, Bucket,
    ByteStream, OpenedBlob,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The blob adapter services embed: allow-list, size ceiling, upload
/// timeout and cleanup of partial writes on top of a raw `BlobStore`.
#[derive(Clone)]
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    config: BlobConfig,
}

impl BlobAdapter {
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    pub fn from_arc(store: Arc<dyn BlobStore>, config: BlobConfig) -> Self {
        Self { store, config }
    }

    /// Store a blob from a stream.
    ///
    /// Rejected content types never reach the store. A stream that fails,
    /// exceeds the size ceiling or outlives the upload timeout leaves no
    /// object behind.
    pub async fn put(
        &self,
        bucket: Bucket,
        put: BlobPut,
        body: ByteStream,
    ) -> BlobResult<BlobReceipt> {
        let content_type = put
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .ok_or_else(|| BlobError::invalid(bucket.rejection_message()))?
            .to_ascii_lowercase();

        if !bucket.accepts(&content_type) {
            return Err(BlobError::invalid(bucket.rejection_message()));
        }

        let max = self.config.max_bytes(bucket);
        if let Some(size) = put.size_hint {
            if size > max {
                return Err(too_large(size, max));
            }
        }

        let exceeded = Arc::new(AtomicBool::new(false));
        let body = limit_stream(body, max, exceeded.clone());

        let id = BlobId::new();
        let filename = put.filename.clone().unwrap_or_else(|| id.to_string());
        let timeout = self.config.upload_timeout;

        let outcome = tokio::time::timeout(
            timeout,
            self.store.put(bucket, &id, &filename, &content_type, body),
        )
        .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                self.discard(bucket, &id).await;
                if exceeded.load(Ordering::SeqCst) {
                    return Err(too_large(max + 1, max));
                }
                return Err(err);
            }
            Err(_) => {
                self.discard(bucket, &id).await;
                tracing::warn!(bucket = bucket.name(), id = %id, "upload timed out");
                return Err(BlobError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
        };

        tracing::info!(
            bucket = bucket.name(),
            id = %id,
            size_bytes = result.size_bytes,
            backend = self.store.backend(),
            "stored blob"
        );

        Ok(BlobReceipt::new(id, bucket, result.size_bytes)
            .with_content_type(content_type)
            .with_filename(filename))
    }

    /// Read a whole blob into memory.
    pub async fn open(&self, bucket: Bucket, id: &str) -> BlobResult<OpenedBlob> {
        let id = BlobId::parse(id)?;
        let get = self.store.get(bucket, &id).await?;

        let mut buf = BytesMut::with_capacity(get.size_bytes as usize);
        let mut stream = get.stream;
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }

        Ok(OpenedBlob {
            id,
            bytes: buf.freeze(),
            content_type: get
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            filename: get.filename,
        })
    }

    /// Delete a blob. Unknown or malformed ids are `NotFound`.
    pub async fn delete(&self, bucket: Bucket, id: &str) -> BlobResult<()> {
        let id = BlobId::parse(id)?;
        self.store.delete(bucket, &id).await?;
        tracing::info!(bucket = bucket.name(), id = %id, "deleted blob");
        Ok(())
    }

    /// Ask the backend to re-establish its connection.
    pub async fn reconnect(&self) -> BlobResult<()> {
        self.store.reconnect().await
    }

    async fn discard(&self, bucket: Bucket, id: &BlobId) {
        if let Err(err) = self.store.discard(bucket, id).await {
            tracing::warn!(bucket = bucket.name(), id = %id, error = %err, "failed to discard partial upload");
        }
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }
}

fn too_large(size: u64, max: u64) -> BlobError {
    BlobError::invalid(format!("Blob size {size} exceeds maximum {max}"))
}

/// Fail the stream as soon as more than `max` bytes have passed through.
fn limit_stream(body: ByteStream, max: u64, exceeded: Arc<AtomicBool>) -> ByteStream {
    let mut seen = 0u64;
    Box::pin(body.map(move |chunk| {
        let chunk = chunk?;
        seen += chunk.len() as u64;
        if seen > max {
            exceeded.store(true, Ordering::SeqCst);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "upload exceeds size limit",
            ));
        }
        Ok(chunk)
    }))
}
