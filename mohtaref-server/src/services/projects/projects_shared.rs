use std::sync::Arc;

use mohtaref_core::{ServiceCapabilities, ServiceHandle, ServiceMethodKind};

use crate::hooks::{CapturePrevious, InvalidateCache};
use crate::models::Project;
use crate::services::{SiteParams, SiteState};

pub fn crud_capabilities() -> ServiceCapabilities {
    ServiceCapabilities::standard_crud()
}

pub fn register_hooks(handle: &ServiceHandle<Project, SiteParams>, state: &SiteState) {
    handle.hooks(|h| {
        h.before(
            ServiceMethodKind::Update,
            Arc::new(CapturePrevious {
                store: state.projects.clone(),
            }),
        );
        h.after_writes(Arc::new(InvalidateCache::<Project>::new(
            state.cache.clone(),
            "/api/projects",
        )));
    });
}
