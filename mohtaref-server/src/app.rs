use std::sync::Arc;

use anyhow::{Context, Result};
use mohtaref_blob::{BlobAdapter, GridFsStore, MemoryBlobStore};
use mohtaref_core::SiteApp;

use crate::config::{self, ServerSettings, StorageBackend};
use crate::services::SiteState;
use crate::thumbnail::{FfmpegExtractor, FrameExtractor};

/// A configured [`SiteApp`] and its typed settings.
pub fn site_app() -> Result<(SiteApp, ServerSettings)> {
    let app = SiteApp::new();
    config::configure(&app);
    let settings = ServerSettings::from_app(&app)?;
    Ok((app, settings))
}

/// Open the stores the settings point at.
pub async fn open_state(settings: &ServerSettings) -> Result<SiteState> {
    let frames: Arc<dyn FrameExtractor> = Arc::new(FfmpegExtractor::new(&settings.ffmpeg_bin));
    let blob_config = settings.blob_config();

    match settings.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, nothing survives a restart");
            let blobs = BlobAdapter::new(MemoryBlobStore::new(), blob_config);
            Ok(SiteState::in_memory(blobs, frames))
        }
        StorageBackend::MongoDb => {
            let gridfs = GridFsStore::connect(&settings.mongodb_uri, &settings.mongodb_database)
                .await
                .context("connecting to MongoDB")?;
            let db = gridfs.database().clone();
            let blobs = BlobAdapter::new(gridfs, blob_config);
            tracing::info!(database = %settings.mongodb_database, "using MongoDB storage");
            SiteState::mongodb(&db, blobs, frames).await
        }
    }
}
