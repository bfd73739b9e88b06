use std::time::Duration;

use bytes::Bytes;

use crate::{bytes_stream, BlobAdapter, BlobPut, BlobReceipt, BlobResult, Bucket};

/// Fixed-delay retry used by bulk imports.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Upload an in-memory payload, retrying transient failures.
///
/// Between attempts the adapter is asked to reconnect. Validation errors
/// are returned immediately.
pub async fn retry_put(
    blobs: &BlobAdapter,
    policy: &RetryPolicy,
    bucket: Bucket,
    put: BlobPut,
    data: Bytes,
) -> BlobResult<BlobReceipt> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match blobs.put(bucket, put.clone(), bytes_stream(data.clone())).await {
            Ok(receipt) => return Ok(receipt),
            Err(err) if err.is_retryable() && attempt < attempts => {
                tracing::warn!(
                    attempt,
                    attempts,
                    error = %err,
                    filename = put.filename.as_deref().unwrap_or(""),
                    "upload failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                if let Err(err) = blobs.reconnect().await {
                    tracing::warn!(error = %err, "reconnect failed");
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
