//! Content and media API for the Mohtaref site.
//!
//! Six document collections (projects, services, testimonials, banners,
//! gallery, videos) exposed over REST, plus image and video upload,
//! streaming and thumbnail extraction backed by an object store.

pub mod app;
pub mod blob_errors;
pub mod collections;
pub mod config;
pub mod hooks;
pub mod media_url;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod thumbnail;

use std::sync::Arc;

use anyhow::Result;
use mohtaref_axum::{axum, AxumApp, CachePolicy};
use mohtaref_blob::{BlobAdapter, MemoryBlobStore};
use mohtaref_core::SiteApp;

use crate::routes::{media_router, MediaState};
use crate::services::SiteState;
use crate::thumbnail::FrameExtractor;

pub use services::{SiteParams, Services};

/// Register every service on `app` and mount the HTTP surface.
pub fn build(app: SiteApp, state: SiteState) -> Result<AxumApp> {
    let svcs = services::configure(&app, &state)?;

    let media = media_router(MediaState {
        blobs: state.blobs.clone(),
        videos: svcs.videos.clone(),
    })?;

    let ax = axum(app)
        .use_service("/api/projects", svcs.projects, CachePolicy::Content)
        .use_service("/api/services", svcs.services, CachePolicy::Content)
        .use_service("/api/testimonials", svcs.testimonials, CachePolicy::Uncached)
        .use_service("/api/banners", svcs.banners, CachePolicy::Media)
        .use_service("/api/gallery", svcs.gallery, CachePolicy::Media)
        .use_service("/api/videos", svcs.videos, CachePolicy::Media)
        .merge(media)
        .service("/health", || async { "ok" })
        .with_response_cache(state.cache.clone())
        .with_tracing();

    Ok(ax)
}

/// Everything in memory, for local runs and tests.
pub fn build_in_memory(frames: Arc<dyn FrameExtractor>) -> Result<(AxumApp, SiteState)> {
    let blobs = BlobAdapter::new(MemoryBlobStore::new(), Default::default());
    let state = SiteState::in_memory(blobs, frames);
    let ax = build(SiteApp::new(), state.clone())?;
    Ok((ax, state))
}
