use std::sync::Arc;

use mohtaref_core::{ServiceCapabilities, ServiceHandle, ServiceMethodKind};

use crate::hooks::{CapturePrevious, InvalidateCache};
use crate::models::Banner;
use crate::services::{SiteParams, SiteState};

pub fn capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud().with(ServiceMethodKind::Upsert)
}

pub fn register_hooks(handle: &ServiceHandle<Banner, SiteParams>, state: &SiteState) {
    let capture = Arc::new(CapturePrevious {
        store: state.banners.clone(),
    });

    handle.hooks(|h| {
        h.before(ServiceMethodKind::Create, capture.clone())
            .before(ServiceMethodKind::Upsert, capture.clone())
            .before(ServiceMethodKind::Update, capture);
        h.after_writes(Arc::new(InvalidateCache::<Banner>::new(
            state.cache.clone(),
            "/api/banners",
        )));
    });
}
