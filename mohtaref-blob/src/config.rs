use std::time::Duration;

use crate::Bucket;

const MIB: u64 = 1024 * 1024;

/// Configuration for blob operations
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Ceiling for a whole upload; partial chunks are discarded past it.
    pub upload_timeout: Duration,

    /// Max size of a single image
    pub max_image_bytes: u64,

    /// Max size of a single video
    pub max_video_bytes: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::from_secs(60),
            max_image_bytes: 10 * MIB,
            max_video_bytes: 200 * MIB,
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn with_max_image_bytes(mut self, bytes: u64) -> Self {
        self.max_image_bytes = bytes;
        self
    }

    pub fn with_max_video_bytes(mut self, bytes: u64) -> Self {
        self.max_video_bytes = bytes;
        self
    }

    pub fn max_bytes(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::Images => self.max_image_bytes,
            Bucket::Videos => self.max_video_bytes,
        }
    }
}
