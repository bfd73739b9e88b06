use std::sync::Arc;

use mohtaref_core::{ServiceHandle, ServiceMethodKind};

use crate::hooks::{CapturePrevious, InvalidateCache};
use crate::models::GalleryImage;
use crate::services::adapters::DocumentAdapter;
use crate::services::{SiteParams, SiteState};

/// Listed by `order`, then creation time. Removing an entry keeps the
/// image object, which other documents may still show.
pub fn service(state: &SiteState) -> DocumentAdapter<GalleryImage> {
    DocumentAdapter::new(state.gallery.clone())
}

pub fn register_hooks(handle: &ServiceHandle<GalleryImage, SiteParams>, state: &SiteState) {
    handle.hooks(|h| {
        h.before(
            ServiceMethodKind::Update,
            Arc::new(CapturePrevious {
                store: state.gallery.clone(),
            }),
        );
        h.after_writes(Arc::new(InvalidateCache::<GalleryImage>::new(
            state.cache.clone(),
            "/api/gallery",
        )));
    });
}
