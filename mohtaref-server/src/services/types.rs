use std::sync::Arc;

use anyhow::Result;
use mohtaref_axum::ResponseCache;
use mohtaref_blob::BlobAdapter;
use mongodb::Database;

use crate::collections::{DocumentStore, MemoryCollection, MongoCollection};
use crate::models::{Banner, Document, GalleryImage, Project, Service, Testimonial, Video};
use crate::thumbnail::FrameExtractor;

pub type SiteParams = mohtaref_axum::RestParams;

/// Process-wide handles, built once at startup and shared by every service.
#[derive(Clone)]
pub struct SiteState {
    pub projects: Arc<dyn DocumentStore<Project>>,
    pub services: Arc<dyn DocumentStore<Service>>,
    pub testimonials: Arc<dyn DocumentStore<Testimonial>>,
    pub banners: Arc<dyn DocumentStore<Banner>>,
    pub gallery: Arc<dyn DocumentStore<GalleryImage>>,
    pub videos: Arc<dyn DocumentStore<Video>>,
    pub blobs: BlobAdapter,
    pub cache: Arc<ResponseCache>,
    pub frames: Arc<dyn FrameExtractor>,
}

impl SiteState {
    pub fn in_memory(blobs: BlobAdapter, frames: Arc<dyn FrameExtractor>) -> Self {
        Self {
            projects: Arc::new(MemoryCollection::<Project>::new()),
            services: Arc::new(MemoryCollection::<Service>::new()),
            testimonials: Arc::new(MemoryCollection::<Testimonial>::new()),
            banners: Arc::new(MemoryCollection::<Banner>::new()),
            gallery: Arc::new(MemoryCollection::<GalleryImage>::new()),
            videos: Arc::new(MemoryCollection::<Video>::new()),
            blobs,
            cache: ResponseCache::new(),
            frames,
        }
    }

    pub async fn mongodb(
        db: &Database,
        blobs: BlobAdapter,
        frames: Arc<dyn FrameExtractor>,
    ) -> Result<Self> {
        Ok(Self {
            projects: mongo_store::<Project>(db).await?,
            services: mongo_store::<Service>(db).await?,
            testimonials: mongo_store::<Testimonial>(db).await?,
            banners: mongo_store::<Banner>(db).await?,
            gallery: mongo_store::<GalleryImage>(db).await?,
            videos: mongo_store::<Video>(db).await?,
            blobs,
            cache: ResponseCache::new(),
            frames,
        })
    }
}

async fn mongo_store<T: Document>(db: &Database) -> Result<Arc<dyn DocumentStore<T>>> {
    let store = MongoCollection::<T>::new(db);
    store.ensure_indexes().await?;
    Ok(Arc::new(store))
}
