use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use mohtaref_blob::{bytes_stream, BlobAdapter, BlobError, BlobPut, Bucket};
use mohtaref_core::errors::SiteError;
use mohtaref_core::{ContentService, ServiceCapabilities};
use serde_json::{json, Value};

use crate::blob_errors::blob_error;
use crate::collections::Filter;
use crate::models::{patch_document, Document, Video};
use crate::services::adapters::DocumentAdapter;
use crate::services::projects::projects_service::release_images;
use crate::services::{SiteParams, SiteState};
use crate::thumbnail::FrameExtractor;

use super::videos_shared::{self, THUMBNAIL};

pub struct VideosService {
    pub adapter: DocumentAdapter<Video>,
    pub blobs: BlobAdapter,
    pub frames: Arc<dyn FrameExtractor>,
}

impl VideosService {
    pub fn new(state: &SiteState) -> Self {
        Self {
            adapter: DocumentAdapter::new(state.videos.clone())
                .with_capabilities(videos_shared::capabilities()),
            blobs: state.blobs.clone(),
            frames: state.frames.clone(),
        }
    }

    /// Extract a still from the stored video, store it in the `images`
    /// bucket and point the video's `thumbnail` at it.
    async fn generate_thumbnail(&self, id: &str) -> Result<Value> {
        let video = self.adapter._get(id).await?;

        let file = self
            .blobs
            .open(Bucket::Videos, &video.video)
            .await
            .map_err(|e| blob_error(e, "Video file not found"))?;

        let jpeg = self.frames.extract_frame(&file.bytes).await?;

        let put = BlobPut::new()
            .with_content_type("image/jpeg")
            .with_filename(format!("thumbnail-{id}-{}.jpg", Utc::now().timestamp_millis()))
            .with_size_hint(jpeg.len() as u64);
        let receipt = self
            .blobs
            .put(Bucket::Images, put, bytes_stream(jpeg))
            .await
            .map_err(|e| blob_error(e, "Thumbnail not found"))?;
        let thumbnail_id = receipt.id.to_string();

        let updated = patch_document(&video, json!({ "thumbnail": thumbnail_id }))?;
        if self.adapter.store.replace(updated).await?.is_none() {
            // the video went away while the frame was extracted
            release_images(&self.blobs, &[thumbnail_id.as_str()]).await;
            return Err(Video::not_found(id));
        }

        tracing::info!(video = id, thumbnail = %thumbnail_id, "generated thumbnail");
        Ok(json!({
            "success": true,
            "thumbnailId": thumbnail_id,
            "message": "Thumbnail generated successfully",
        }))
    }
}

#[async_trait]
impl ContentService<Video, SiteParams> for VideosService {
    fn capabilities(&self) -> ServiceCapabilities {
        videos_shared::capabilities()
    }

    async fn find(&self, _params: SiteParams) -> Result<Vec<Video>> {
        self.adapter._find(&Filter::all()).await
    }

    async fn get(&self, id: &str, _params: SiteParams) -> Result<Video> {
        self.adapter._get(id).await
    }

    async fn create(&self, data: Value, _params: SiteParams) -> Result<Video> {
        self.adapter._create(data).await
    }

    async fn update(&self, id: &str, data: Value, _params: SiteParams) -> Result<Video> {
        self.adapter._update(id, data).await
    }

    /// Removes the document, then its video object and thumbnail.
    async fn remove(&self, id: &str, _params: SiteParams) -> Result<Video> {
        let removed = self.adapter._remove(id).await?;

        for video_id in removed.video_refs() {
            match self.blobs.delete(Bucket::Videos, video_id).await {
                Ok(()) | Err(BlobError::NotFound { .. }) => {}
                Err(err) => tracing::warn!(id = video_id, error = %err, "failed to release video"),
            }
        }
        release_images(&self.blobs, &removed.image_refs()).await;

        Ok(removed)
    }

    async fn custom(
        &self,
        method: &str,
        id: Option<&str>,
        _data: Option<Value>,
        _params: SiteParams,
    ) -> Result<Value> {
        match (method, id) {
            (THUMBNAIL, Some(id)) => self.generate_thumbnail(id).await,
            (THUMBNAIL, None) => Err(SiteError::bad_request("A video id is required").into_anyhow()),
            _ => Err(SiteError::method_not_allowed(format!("Unknown method: {method}")).into_anyhow()),
        }
    }
}
