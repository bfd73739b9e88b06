//! # mohtaref-blob: image and video object storage
//!
//! Two logical buckets, `images` and `videos`, each with a content-type
//! allow-list and a size ceiling. Objects are addressed by 24-hex ids.
//!
//! ```text
//! ┌─────────────────┐
//! │   Services      │  ← documents reference blob ids
//! ├─────────────────┤
//! │   BlobAdapter   │  ← allow-list, size limit, timeout, cleanup
//! ├─────────────────┤
//! │   BlobStore     │  ← GridFS or in-memory primitives
//! └─────────────────┘
//! ```
//!
//! ```rust
//! use mohtaref_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let blobs = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default());
//!
//! let put = BlobPut::new()
//!     .with_content_type("image/png")
//!     .with_filename("logo.png");
//! let receipt = blobs.put(Bucket::Images, put, bytes_stream(&b"png"[..])).await?;
//!
//! let opened = blobs.open(Bucket::Images, receipt.id.as_str()).await?;
//! assert_eq!(opened.content_type, "image/png");
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod config;
mod error;
mod gridfs;
mod memory;
mod receipt;
mod retry;
pub mod store;
mod types;

pub use adapter::BlobAdapter;
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use gridfs::GridFsStore;
pub use memory::MemoryBlobStore;
pub use receipt::{BlobReceipt, OpenedBlob};
pub use retry::{retry_put, RetryPolicy};
pub use store::{BlobStore, GetResult, PutResult};
pub use types::{bytes_stream, BlobId, BlobPut, Bucket, ByteStream};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        bytes_stream, BlobAdapter, BlobConfig, BlobError, BlobId, BlobPut, BlobReceipt,
        BlobResult, BlobStore, Bucket, ByteStream, MemoryBlobStore,
    };
}
