use async_trait::async_trait;
use futures::{AsyncReadExt, AsyncWriteExt, StreamExt};
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, GridFsErrorKind};
use mongodb::gridfs::GridFsBucket;
use mongodb::options::GridFsBucketOptions;
use mongodb::{Client, Database};
use tokio::sync::OnceCell;

use crate::store::{GetResult, PutResult};
use crate::{bytes_stream, BlobError, BlobId, BlobResult, BlobStore, Bucket, ByteStream};

/// MongoDB GridFS object store with one GridFS bucket per logical bucket.
///
/// Bucket handles are created on first use and live for the process.
pub struct GridFsStore {
    db: Database,
    images: OnceCell<GridFsBucket>,
    videos: OnceCell<GridFsBucket>,
}

impl GridFsStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            images: OnceCell::new(),
            videos: OnceCell::new(),
        }
    }

    /// Connect with a connection string and pick a database.
    pub async fn connect(uri: &str, database: &str) -> BlobResult<Self> {
        let client = Client::with_uri_str(uri).await.map_err(map_mongo)?;
        Ok(Self::new(client.database(database)))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn bucket(&self, bucket: Bucket) -> &GridFsBucket {
        let cell = match bucket {
            Bucket::Images => &self.images,
            Bucket::Videos => &self.videos,
        };

        cell.get_or_init(|| async {
            tracing::debug!(bucket = bucket.name(), "opening GridFS bucket");
            let options = GridFsBucketOptions::builder()
                .bucket_name(bucket.name().to_string())
                .build();
            self.db.gridfs_bucket(options)
        })
        .await
    }

    async fn abort_upload(upload: &mut mongodb::gridfs::GridFsUploadStream, id: &BlobId) {
        if let Err(err) = upload.abort().await {
            tracing::warn!(id = %id, error = %err, "failed to abort GridFS upload");
        }
    }
}

fn map_mongo(err: MongoError) -> BlobError {
    let missing = matches!(
        *err.kind,
        ErrorKind::GridFs(GridFsErrorKind::FileNotFound { .. })
    );
    let unreachable = matches!(
        *err.kind,
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. }
    );

    if missing {
        BlobError::not_found(err.to_string())
    } else if unreachable {
        BlobError::unavailable(err.to_string())
    } else {
        BlobError::backend(err)
    }
}

#[async_trait]
impl BlobStore for GridFsStore {
    async fn put(
        &self,
        bucket: Bucket,
        id: &BlobId,
        filename: &str,
        content_type: &str,
        mut stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let oid = id.object_id()?;
        let gridfs = self.bucket(bucket).await;

        let mut upload = gridfs
            .open_upload_stream(filename)
            .id(Bson::ObjectId(oid))
            .metadata(doc! { "contentType": content_type })
            .await
            .map_err(map_mongo)?;

        let mut size_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    Self::abort_upload(&mut upload, id).await;
                    return Err(err.into());
                }
            };
            if let Err(err) = upload.write_all(&chunk).await {
                Self::abort_upload(&mut upload, id).await;
                return Err(err.into());
            }
            size_bytes += chunk.len() as u64;
        }

        upload.close().await?;
        tracing::debug!(bucket = bucket.name(), id = %id, size_bytes, "GridFS upload finished");

        Ok(PutResult { size_bytes })
    }

    async fn get(&self, bucket: Bucket, id: &BlobId) -> BlobResult<GetResult> {
        let oid = id.object_id()?;
        let gridfs = self.bucket(bucket).await;

        let file = gridfs
            .find_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo)?
            .ok_or_else(|| BlobError::not_found(id.as_str()))?;

        let mut download = gridfs
            .open_download_stream(Bson::ObjectId(oid))
            .await
            .map_err(map_mongo)?;

        let mut buf = Vec::with_capacity(file.length as usize);
        download.read_to_end(&mut buf).await?;

        let content_type = file
            .metadata
            .as_ref()
            .and_then(|m| m.get_str("contentType").ok())
            .map(str::to_string);

        Ok(GetResult {
            size_bytes: buf.len() as u64,
            stream: bytes_stream(buf),
            content_type,
            filename: file.filename,
        })
    }

    async fn delete(&self, bucket: Bucket, id: &BlobId) -> BlobResult<()> {
        let oid = id.object_id()?;
        self.bucket(bucket)
            .await
            .delete(Bson::ObjectId(oid))
            .await
            .map_err(|err| match map_mongo(err) {
                BlobError::NotFound { .. } => BlobError::not_found(id.as_str()),
                other => other,
            })
    }

    async fn discard(&self, bucket: Bucket, id: &BlobId) -> BlobResult<()> {
        let oid = id.object_id()?;
        let chunks = self
            .db
            .collection::<Document>(&format!("{}.chunks", bucket.name()));
        let files = self
            .db
            .collection::<Document>(&format!("{}.files", bucket.name()));

        chunks
            .delete_many(doc! { "files_id": oid })
            .await
            .map_err(map_mongo)?;
        files
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(map_mongo)?;
        Ok(())
    }

    async fn reconnect(&self) -> BlobResult<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_mongo)
    }

    fn backend(&self) -> &'static str {
        "gridfs"
    }
}
