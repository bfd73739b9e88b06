use std::sync::Arc;

use mohtaref_core::{ServiceCapabilities, ServiceHandle, ServiceMethodKind};

use crate::hooks::{CapturePrevious, InvalidateCache};
use crate::models::Video;
use crate::services::{SiteParams, SiteState};

/// Custom method extracting a thumbnail frame.
pub const THUMBNAIL: &str = "thumbnail";

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud().with(ServiceMethodKind::Custom(THUMBNAIL))
}

pub fn register_hooks(handle: &ServiceHandle<Video, SiteParams>, state: &SiteState) {
    let invalidate = Arc::new(InvalidateCache::<Video>::new(state.cache.clone(), "/api/videos"));

    handle.hooks(|h| {
        h.before(
            ServiceMethodKind::Update,
            Arc::new(CapturePrevious {
                store: state.videos.clone(),
            }),
        );
        h.after_writes(invalidate.clone());
        h.after(ServiceMethodKind::Custom(THUMBNAIL), invalidate);
    });
}
